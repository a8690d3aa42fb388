use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::debug;

use crate::errors::{RateError, Result};
use crate::models::{CurrencyUnit, ExchangeRate, Money};
use crate::provider::RateProvider;

/// Converts monetary amounts using rates resolved from one provider.
///
/// The rate is resolved on every call; nothing is cached. No rounding is
/// applied: round the result afterwards if needed.
#[derive(Clone)]
pub struct Converter {
    provider: Arc<dyn RateProvider>,
    timestamp: Option<DateTime<Utc>>,
}

impl Converter {
    pub fn new(provider: Arc<dyn RateProvider>) -> Self {
        Self {
            provider,
            timestamp: None,
        }
    }

    /// A copy of this converter that resolves rates valid at `timestamp`.
    pub fn at(&self, timestamp: DateTime<Utc>) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            timestamp: Some(timestamp),
        }
    }

    pub fn provider(&self) -> &Arc<dyn RateProvider> {
        &self.provider
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// The rate this converter would apply for `base -> term`.
    pub fn exchange_rate(&self, base: &CurrencyUnit, term: &CurrencyUnit) -> Option<ExchangeRate> {
        self.provider.exchange_rate(base, term, self.timestamp)
    }

    /// Converts `amount` into `target` using the bound timestamp, if any.
    pub fn convert(&self, amount: &Money, target: &CurrencyUnit) -> Result<Money> {
        self.convert_with(amount, target, self.timestamp)
    }

    /// Converts `amount` into `target` using a rate valid at `timestamp`.
    pub fn convert_at(
        &self,
        amount: &Money,
        target: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> Result<Money> {
        self.convert_with(amount, target, Some(timestamp))
    }

    fn convert_with(
        &self,
        amount: &Money,
        target: &CurrencyUnit,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Money> {
        if amount.currency() == target {
            return Ok(amount.clone());
        }

        let rate = self
            .provider
            .exchange_rate(amount.currency(), target, timestamp)
            .ok_or_else(|| RateError::NoRateAvailable {
                base: amount.currency().to_string(),
                term: target.to_string(),
                timestamp,
            })?;

        debug!(
            "Converting {} to {} via '{}' using {}",
            amount,
            target,
            self.provider.id(),
            rate
        );
        apply_rate(amount, &rate)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("provider", &self.provider.id())
            .field("rate_type", self.provider.rate_type())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Multiplies `amount` by the rate factor and tags the result with the rate's term.
pub fn apply_rate(amount: &Money, rate: &ExchangeRate) -> Result<Money> {
    if amount.currency() != rate.base() {
        return Err(RateError::InvalidRate(format!(
            "rate {} cannot convert an amount in {}",
            rate,
            amount.currency()
        )));
    }
    let value = amount
        .amount()
        .checked_mul(rate.factor())
        .ok_or_else(|| RateError::Overflow(format!("{} * {}", amount, rate.factor())))?;
    Ok(Money::new(value, rate.term().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RateType;
    use crate::provider::StaticRateProvider;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn provider() -> Arc<StaticRateProvider> {
        let provider = StaticRateProvider::new("TEST", RateType::REALTIME);
        provider
            .add_rate(
                ExchangeRate::builder()
                    .rate_type(RateType::REALTIME)
                    .base(CurrencyUnit::CHF)
                    .term(CurrencyUnit::EUR)
                    .factor(dec!(0.91))
                    .provider("TEST")
                    .valid_from(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        Arc::new(provider)
    }

    #[test]
    fn test_convert_multiplies_by_factor() {
        let converter = provider().get_converter();
        let result = converter
            .convert(&Money::new(dec!(100), CurrencyUnit::CHF), &CurrencyUnit::EUR)
            .unwrap();
        assert_eq!(result.amount(), dec!(91.00));
        assert_eq!(result.currency(), &CurrencyUnit::EUR);
    }

    #[test]
    fn test_convert_keeps_full_precision() {
        let converter = provider().get_converter();
        let result = converter
            .convert(&Money::new(dec!(0.333), CurrencyUnit::CHF), &CurrencyUnit::EUR)
            .unwrap();
        assert_eq!(result.amount(), dec!(0.30303));
    }

    #[test]
    fn test_convert_same_currency_is_identity() {
        let converter = provider().get_converter();
        let money = Money::new(dec!(12.5), CurrencyUnit::USD);
        assert_eq!(converter.convert(&money, &CurrencyUnit::USD).unwrap(), money);
    }

    #[test]
    fn test_convert_without_rate_fails() {
        let converter = provider().get_converter();
        let result = converter.convert(&Money::new(dec!(1), CurrencyUnit::USD), &CurrencyUnit::JPY);
        assert_eq!(
            result,
            Err(RateError::NoRateAvailable {
                base: "USD".to_string(),
                term: "JPY".to_string(),
                timestamp: None,
            })
        );
    }

    #[test]
    fn test_timestamp_is_threaded_to_lookup() {
        let converter = provider().get_converter();
        let before = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let money = Money::new(dec!(1), CurrencyUnit::CHF);

        assert!(converter.convert_at(&money, &CurrencyUnit::EUR, before).is_err());
        assert!(converter.at(before).convert(&money, &CurrencyUnit::EUR).is_err());

        let after = Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap();
        assert!(converter.at(after).convert(&money, &CurrencyUnit::EUR).is_ok());
    }

    #[test]
    fn test_apply_rate_rejects_wrong_base() {
        let rate = ExchangeRate::identity(RateType::OTHER, CurrencyUnit::EUR, "IDENT");
        let result = apply_rate(&Money::new(dec!(1), CurrencyUnit::USD), &rate);
        assert!(matches!(result, Err(RateError::InvalidRate(_))));
    }
}
