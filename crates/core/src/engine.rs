//! Conversion engine facade.
//!
//! The engine owns one provider per rate type, built from an explicitly
//! injected provider list. Callers pick a rate type and the engine dispatches
//! to the matching provider, or to a [`CompoundProvider`] when several
//! providers serve the same rate type.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};
use ratebridge_rates::{
    CompoundProvider, Converter, CurrencyUnit, ExchangeRate, Money, RateProvider, RateType,
};

use crate::errors::{EngineError, Result};
use crate::lazy::{LazyConverter, TimestampBinding};

/// Entry point for currency conversion.
pub struct ConversionEngine {
    providers: BTreeMap<RateType, Arc<dyn RateProvider>>,
}

impl ConversionEngine {
    /// Creates an engine from the given providers.
    ///
    /// Providers are grouped by rate type. A rate type served by more than one
    /// provider gets a [`CompoundProvider`] that consults them in the order
    /// given here.
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn RateProvider>>) -> Result<Self> {
        let mut grouped: BTreeMap<RateType, Vec<Arc<dyn RateProvider>>> = BTreeMap::new();
        for provider in providers {
            grouped
                .entry(provider.rate_type().clone())
                .or_default()
                .push(provider);
        }

        let mut resolved = BTreeMap::new();
        for (rate_type, mut group) in grouped {
            let provider: Arc<dyn RateProvider> = if group.len() == 1 {
                group.remove(0)
            } else {
                let ids: Vec<&str> = group.iter().map(|p| p.id()).collect();
                info!("Rate type {} served by providers {:?}", rate_type, ids);
                Arc::new(CompoundProvider::with_providers(
                    format!("COMPOUND[{}]", rate_type),
                    rate_type.clone(),
                    group,
                )?)
            };
            resolved.insert(rate_type, provider);
        }

        info!("Conversion engine ready with {} rate types", resolved.len());
        Ok(Self {
            providers: resolved,
        })
    }

    /// The provider serving `rate_type`.
    pub fn get_provider(&self, rate_type: &RateType) -> Result<Arc<dyn RateProvider>> {
        self.providers
            .get(rate_type)
            .cloned()
            .ok_or_else(|| EngineError::UnsupportedRateType(rate_type.clone()))
    }

    pub fn get_supported_rate_types(&self) -> BTreeSet<RateType> {
        self.providers.keys().cloned().collect()
    }

    pub fn is_supported_rate_type(&self, rate_type: &RateType) -> bool {
        self.providers.contains_key(rate_type)
    }

    /// A converter bound to the provider serving `rate_type`.
    pub fn get_converter(&self, rate_type: &RateType) -> Result<Converter> {
        Ok(self.get_provider(rate_type)?.get_converter())
    }

    /// Looks up a rate. `Ok(None)` means the provider has no quote for the pair.
    pub fn get_exchange_rate(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        rate_type: &RateType,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Option<ExchangeRate>> {
        let provider = self.get_provider(rate_type)?;
        let rate = provider.exchange_rate(base, term, timestamp);
        if rate.is_none() {
            debug!(
                "No {} rate for {} -> {} from '{}'",
                rate_type,
                base,
                term,
                provider.id()
            );
        }
        Ok(rate)
    }

    /// Converts `amount` into `target` at the latest available rate.
    pub fn convert(
        &self,
        amount: &Money,
        target: &CurrencyUnit,
        rate_type: &RateType,
    ) -> Result<Money> {
        Ok(self.get_converter(rate_type)?.convert(amount, target)?)
    }

    /// Converts `amount` into `target` at a rate valid at `timestamp`.
    pub fn convert_at(
        &self,
        amount: &Money,
        target: &CurrencyUnit,
        rate_type: &RateType,
        timestamp: DateTime<Utc>,
    ) -> Result<Money> {
        Ok(self
            .get_converter(rate_type)?
            .convert_at(amount, target, timestamp)?)
    }

    /// A converter into `target` that resolves its provider and rate only when
    /// called, and again on every call.
    pub fn lazy_converter(
        self: &Arc<Self>,
        rate_type: RateType,
        target: CurrencyUnit,
        binding: TimestampBinding,
    ) -> LazyConverter {
        LazyConverter::new(Arc::clone(self), rate_type, target, binding)
    }
}

impl fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers: BTreeMap<&RateType, &str> =
            self.providers.iter().map(|(k, v)| (k, v.id())).collect();
        f.debug_struct("ConversionEngine")
            .field("providers", &providers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratebridge_rates::{IdentityRateProvider, RateError, StaticRateProvider};
    use rust_decimal_macros::dec;

    fn quote(
        provider: &str,
        rate_type: RateType,
        base: CurrencyUnit,
        term: CurrencyUnit,
        factor: rust_decimal::Decimal,
    ) -> ExchangeRate {
        ExchangeRate::builder()
            .rate_type(rate_type)
            .base(base)
            .term(term)
            .factor(factor)
            .provider(provider)
            .build()
            .unwrap()
    }

    fn static_provider(id: &str, rates: Vec<ExchangeRate>) -> Arc<dyn RateProvider> {
        Arc::new(StaticRateProvider::with_rates(id, RateType::REALTIME, rates).unwrap())
    }

    #[test]
    fn test_groups_providers_by_rate_type() {
        let a = static_provider("A", vec![]);
        let b = static_provider(
            "B",
            vec![quote(
                "B",
                RateType::REALTIME,
                CurrencyUnit::CHF,
                CurrencyUnit::EUR,
                dec!(0.91),
            )],
        );
        let identity: Arc<dyn RateProvider> = Arc::new(IdentityRateProvider::new());

        let engine = ConversionEngine::new(vec![a, b, identity]).unwrap();

        assert_eq!(
            engine.get_supported_rate_types(),
            BTreeSet::from([RateType::OTHER, RateType::REALTIME])
        );
        assert!(engine.is_supported_rate_type(&RateType::REALTIME));
        assert!(!engine.is_supported_rate_type(&RateType::HISTORIC));

        let realtime = engine.get_provider(&RateType::REALTIME).unwrap();
        assert_eq!(realtime.id(), "COMPOUND[REALTIME]");
        assert_eq!(engine.get_provider(&RateType::OTHER).unwrap().id(), "IDENT");

        let rate = engine
            .get_exchange_rate(
                &CurrencyUnit::CHF,
                &CurrencyUnit::EUR,
                &RateType::REALTIME,
                None,
            )
            .unwrap()
            .unwrap();
        assert_eq!(rate.provider(), "B");
    }

    #[test]
    fn test_convert() {
        let provider = static_provider(
            "ECB",
            vec![quote(
                "ECB",
                RateType::REALTIME,
                CurrencyUnit::CHF,
                CurrencyUnit::EUR,
                dec!(0.91),
            )],
        );
        let engine = ConversionEngine::new(vec![provider]).unwrap();

        let converted = engine
            .convert(
                &Money::new(dec!(100), CurrencyUnit::CHF),
                &CurrencyUnit::EUR,
                &RateType::REALTIME,
            )
            .unwrap();
        assert_eq!(converted, Money::new(dec!(91.00), CurrencyUnit::EUR));
    }

    #[test]
    fn test_unsupported_rate_type() {
        let engine = ConversionEngine::new(Vec::new()).unwrap();
        assert!(engine.get_supported_rate_types().is_empty());
        assert_eq!(
            engine.get_converter(&RateType::HISTORIC).err(),
            Some(EngineError::UnsupportedRateType(RateType::HISTORIC))
        );
        assert!(matches!(
            engine.get_exchange_rate(
                &CurrencyUnit::USD,
                &CurrencyUnit::EUR,
                &RateType::HISTORIC,
                None
            ),
            Err(EngineError::UnsupportedRateType(_))
        ));
    }

    #[test]
    fn test_missing_rate() {
        let engine = ConversionEngine::new(vec![static_provider("EMPTY", vec![])]).unwrap();
        assert_eq!(
            engine
                .get_exchange_rate(
                    &CurrencyUnit::USD,
                    &CurrencyUnit::EUR,
                    &RateType::REALTIME,
                    None
                )
                .unwrap(),
            None
        );
        let result = engine.convert(
            &Money::new(dec!(1), CurrencyUnit::USD),
            &CurrencyUnit::EUR,
            &RateType::REALTIME,
        );
        assert!(matches!(
            result,
            Err(EngineError::Rate(RateError::NoRateAvailable { .. }))
        ));
    }
}
