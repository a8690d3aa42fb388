use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::conversion::Converter;
use crate::models::{CurrencyUnit, ExchangeRate, RateType};
use crate::provider::RateProvider;

const PROVIDER_ID: &str = "IDENT";

/// Answers `base == term` with an unbounded factor-one rate, for any currency.
pub struct IdentityRateProvider {
    rate_type: RateType,
}

impl IdentityRateProvider {
    pub fn new() -> Self {
        Self {
            rate_type: RateType::OTHER,
        }
    }

    /// Serves identity rates under a different rate type, so the provider can
    /// join a compound provider of that type.
    pub fn with_rate_type(rate_type: RateType) -> Self {
        Self { rate_type }
    }
}

impl Default for IdentityRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RateProvider for IdentityRateProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    fn rate_type(&self) -> &RateType {
        &self.rate_type
    }

    fn exchange_rate(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        _timestamp: Option<DateTime<Utc>>,
    ) -> Option<ExchangeRate> {
        (base == term)
            .then(|| ExchangeRate::identity(self.rate_type.clone(), base.clone(), PROVIDER_ID))
    }

    fn get_converter(self: Arc<Self>) -> Converter {
        Converter::new(self)
    }
}
