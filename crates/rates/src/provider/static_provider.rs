//! Single-source provider over in-memory quotes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::conversion::Converter;
use crate::errors::{RateError, Result};
use crate::models::{CurrencyUnit, ExchangeRate, RateType};
use crate::provider::RateProvider;

type Pair = (CurrencyUnit, CurrencyUnit);

/// A provider serving directly quoted rates held in memory.
///
/// Quotes per pair are kept sorted by `valid_from`. A lookup without timestamp
/// returns the most recent quote; with a timestamp, the latest quote valid at
/// that instant. A pair quoted only in the other direction is answered with the
/// reciprocal.
pub struct StaticRateProvider {
    id: String,
    rate_type: RateType,
    rates: RwLock<HashMap<Pair, Vec<ExchangeRate>>>,
}

impl StaticRateProvider {
    pub fn new(id: impl Into<String>, rate_type: RateType) -> Self {
        Self {
            id: id.into(),
            rate_type,
            rates: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a provider pre-loaded with `rates`.
    pub fn with_rates(
        id: impl Into<String>,
        rate_type: RateType,
        rates: impl IntoIterator<Item = ExchangeRate>,
    ) -> Result<Self> {
        let provider = Self::new(id, rate_type);
        for rate in rates {
            provider.add_rate(rate)?;
        }
        Ok(provider)
    }

    /// Adds a quote. The quote must carry this provider's rate type.
    pub fn add_rate(&self, rate: ExchangeRate) -> Result<()> {
        if rate.rate_type() != &self.rate_type {
            return Err(RateError::InvalidRate(format!(
                "provider '{}' serves {} rates, got {}",
                self.id,
                self.rate_type,
                rate.rate_type()
            )));
        }

        debug!("Provider '{}' adding quote {}", self.id, rate);
        let pair = (rate.base().clone(), rate.term().clone());
        let mut rates = self.write_rates();
        let quotes = rates.entry(pair).or_default();
        quotes.push(rate);
        quotes.sort_by_key(|r| r.valid_from());
        Ok(())
    }

    fn read_rates(&self) -> RwLockReadGuard<'_, HashMap<Pair, Vec<ExchangeRate>>> {
        self.rates.read().unwrap_or_else(|poisoned| {
            warn!("Rate table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_rates(&self) -> RwLockWriteGuard<'_, HashMap<Pair, Vec<ExchangeRate>>> {
        self.rates.write().unwrap_or_else(|poisoned| {
            warn!("Rate table lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn select(quotes: &[ExchangeRate], timestamp: Option<DateTime<Utc>>) -> Option<&ExchangeRate> {
        match timestamp {
            Some(ts) => quotes.iter().rev().find(|r| r.is_valid(ts)),
            None => quotes.last(),
        }
    }
}

impl RateProvider for StaticRateProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn rate_type(&self) -> &RateType {
        &self.rate_type
    }

    fn exchange_rate(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<ExchangeRate> {
        let rates = self.read_rates();

        let direct = rates
            .get(&(base.clone(), term.clone()))
            .and_then(|quotes| Self::select(quotes, timestamp));
        if let Some(rate) = direct {
            return Some(rate.clone());
        }

        rates
            .get(&(term.clone(), base.clone()))
            .and_then(|quotes| Self::select(quotes, timestamp))
            .and_then(|rate| rate.reciprocal().ok())
    }

    fn get_converter(self: Arc<Self>) -> Converter {
        Converter::new(self)
    }
}
