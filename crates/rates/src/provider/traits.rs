//! Rate provider trait definitions.
//!
//! This module defines the core `RateProvider` trait that every exchange-rate
//! source implements: single-source, compound and time-series providers alike.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::conversion::Converter;
use crate::models::{CurrencyUnit, ExchangeRate, RateType};

/// Trait for exchange-rate providers.
///
/// Lookups never fail: an unknown currency or a missing quote is reported as
/// `None` (or `false`). When a timestamp is supplied, providers return rates
/// whose validity window contains it. The IMF time-series provider is the one
/// documented exception: it falls back to its oldest quote.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use ratebridge_rates::{Converter, CurrencyUnit, ExchangeRate, RateProvider, RateType};
///
/// struct FixedProvider;
///
/// impl RateProvider for FixedProvider {
///     fn id(&self) -> &str {
///         "FIXED"
///     }
///
///     fn rate_type(&self) -> &RateType {
///         &RateType::OTHER
///     }
///
///     fn exchange_rate(&self, base: &CurrencyUnit, term: &CurrencyUnit, _at: Option<DateTime<Utc>>)
///         -> Option<ExchangeRate> {
///         // ... look up a quote
///     }
///
///     fn get_converter(self: Arc<Self>) -> Converter {
///         Converter::new(self)
///     }
/// }
/// ```
pub trait RateProvider: Send + Sync {
    /// Provider name, stamped into the rates it produces and used for logging.
    fn id(&self) -> &str;

    /// The quotation regime served by this provider. Fixed per instance.
    fn rate_type(&self) -> &RateType;

    /// Resolves a rate for `base -> term`, optionally at a point in time.
    fn exchange_rate(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<ExchangeRate>;

    /// A converter bound to this provider.
    fn get_converter(self: Arc<Self>) -> Converter;

    /// Latest rate for `base -> term`.
    fn get_exchange_rate(&self, base: &CurrencyUnit, term: &CurrencyUnit) -> Option<ExchangeRate> {
        self.exchange_rate(base, term, None)
    }

    /// Rate for `base -> term` valid at `timestamp`.
    fn get_exchange_rate_at(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> Option<ExchangeRate> {
        self.exchange_rate(base, term, Some(timestamp))
    }

    fn is_available(&self, base: &CurrencyUnit, term: &CurrencyUnit) -> bool {
        self.get_exchange_rate(base, term).is_some()
    }

    fn is_available_at(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> bool {
        self.get_exchange_rate_at(base, term, timestamp).is_some()
    }

    /// The reversed quote (`term -> base`, reciprocal factor, chain reversed).
    ///
    /// Returns `None` when the provider cannot offer a reciprocal.
    fn get_reversed(&self, rate: &ExchangeRate) -> Option<ExchangeRate> {
        rate.reciprocal().ok()
    }
}
