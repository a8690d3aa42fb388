//! Lazily bound converter.
//!
//! A [`LazyConverter`] stores only the rate type, the target currency and how
//! to pick the conversion timestamp. The provider and the rate are resolved
//! through the engine on every call, so a long-lived converter always uses the
//! current rate without the caller re-fetching a provider handle.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ratebridge_rates::{CurrencyUnit, ExchangeRate, Money, RateType};

use crate::engine::ConversionEngine;
use crate::errors::Result;

/// How a [`LazyConverter`] picks the timestamp for each conversion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampBinding {
    /// No timestamp: the provider's most recent rate.
    #[default]
    Latest,
    /// The wall-clock time of each call.
    Now,
    /// A fixed point in time.
    Fixed(DateTime<Utc>),
}

impl TimestampBinding {
    /// The timestamp to use for a conversion happening now.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Latest => None,
            Self::Now => Some(Utc::now()),
            Self::Fixed(timestamp) => Some(*timestamp),
        }
    }
}

/// Converts into a fixed target currency, resolving provider and rate per call.
#[derive(Clone)]
pub struct LazyConverter {
    engine: Arc<ConversionEngine>,
    rate_type: RateType,
    target: CurrencyUnit,
    binding: TimestampBinding,
}

impl LazyConverter {
    pub fn new(
        engine: Arc<ConversionEngine>,
        rate_type: RateType,
        target: CurrencyUnit,
        binding: TimestampBinding,
    ) -> Self {
        Self {
            engine,
            rate_type,
            target,
            binding,
        }
    }

    pub fn rate_type(&self) -> &RateType {
        &self.rate_type
    }

    pub fn target(&self) -> &CurrencyUnit {
        &self.target
    }

    pub fn binding(&self) -> TimestampBinding {
        self.binding
    }

    /// A copy of this converter using a different timestamp binding.
    pub fn with_binding(&self, binding: TimestampBinding) -> Self {
        Self {
            binding,
            ..self.clone()
        }
    }

    /// The rate a conversion from `base` would use right now.
    pub fn exchange_rate(&self, base: &CurrencyUnit) -> Result<Option<ExchangeRate>> {
        self.engine.get_exchange_rate(
            base,
            &self.target,
            &self.rate_type,
            self.binding.resolve(),
        )
    }

    pub fn convert(&self, amount: &Money) -> Result<Money> {
        let converter = self.engine.get_converter(&self.rate_type)?;
        let converted = match self.binding.resolve() {
            Some(timestamp) => converter.convert_at(amount, &self.target, timestamp)?,
            None => converter.convert(amount, &self.target)?,
        };
        Ok(converted)
    }

    /// Converts every amount, stopping at the first failure.
    pub fn convert_all<'a>(
        &self,
        amounts: impl IntoIterator<Item = &'a Money>,
    ) -> Result<Vec<Money>> {
        amounts
            .into_iter()
            .map(|amount| self.convert(amount))
            .collect()
    }
}

impl fmt::Debug for LazyConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyConverter")
            .field("rate_type", &self.rate_type)
            .field("target", &self.target)
            .field("binding", &self.binding)
            .finish()
    }
}
