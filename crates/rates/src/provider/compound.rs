//! Compound provider aggregating several providers of one rate type.
//!
//! Children are consulted in registration order and the first answer wins.
//! A single reader/writer lock guards the child list: registration takes the
//! write lock, and every lookup holds the read lock for its whole iteration so
//! it sees one consistent set of children.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::conversion::Converter;
use crate::errors::{RateError, Result};
use crate::models::{CurrencyUnit, ExchangeRate, RateType};
use crate::provider::RateProvider;

/// Several providers sharing one rate type, presented as one provider.
pub struct CompoundProvider {
    id: String,
    rate_type: RateType,
    providers: RwLock<Vec<Arc<dyn RateProvider>>>,
}

impl CompoundProvider {
    /// Creates an empty compound provider. Every lookup returns `None` until a
    /// child is added.
    pub fn new(id: impl Into<String>, rate_type: RateType) -> Self {
        Self {
            id: id.into(),
            rate_type,
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Creates a compound provider from an explicit list of children.
    ///
    /// Fails on the first child whose rate type differs.
    pub fn with_providers(
        id: impl Into<String>,
        rate_type: RateType,
        providers: impl IntoIterator<Item = Arc<dyn RateProvider>>,
    ) -> Result<Self> {
        let compound = Self::new(id, rate_type);
        for provider in providers {
            compound.add_provider(provider)?;
        }
        Ok(compound)
    }

    /// Registers a child provider after the existing ones.
    ///
    /// The provider is rejected, and not added, when its rate type differs.
    pub fn add_provider(&self, provider: Arc<dyn RateProvider>) -> Result<()> {
        if provider.rate_type() != &self.rate_type {
            warn!(
                "Rejecting provider '{}' ({}) from compound '{}' ({})",
                provider.id(),
                provider.rate_type(),
                self.id,
                self.rate_type
            );
            return Err(RateError::IncompatibleProvider {
                expected: self.rate_type.to_string(),
                actual: provider.rate_type().to_string(),
            });
        }

        let mut providers = self.write_providers();
        info!(
            "Compound '{}' registered provider '{}' at position {}",
            self.id,
            provider.id(),
            providers.len()
        );
        providers.push(provider);
        Ok(())
    }

    /// Snapshot of the registered children, in registration order.
    pub fn providers(&self) -> Vec<Arc<dyn RateProvider>> {
        self.read_providers().clone()
    }

    pub fn len(&self) -> usize {
        self.read_providers().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_providers().is_empty()
    }

    /// Lock the child list for reading, recovering from poison if necessary.
    ///
    /// Children are only ever appended, so a poisoned list is still a valid list.
    fn read_providers(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn RateProvider>>> {
        self.providers.read().unwrap_or_else(|poisoned| {
            warn!("Compound provider lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_providers(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn RateProvider>>> {
        self.providers.write().unwrap_or_else(|poisoned| {
            warn!("Compound provider lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl RateProvider for CompoundProvider {
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
        let providers = self.read_providers();
        let found = providers.iter().find_map(|provider| {
            let rate = provider.exchange_rate(base, term, timestamp);
            if rate.is_some() {
                debug!(
                    "Compound '{}' resolved {} -> {} from '{}'",
                    self.id,
                    base,
                    term,
                    provider.id()
                );
            }
            rate
        });

        if found.is_none() {
            debug!(
                "Compound '{}' has no rate for {} -> {} among {} providers",
                self.id,
                base,
                term,
                providers.len()
            );
        }
        found
    }

    fn is_available(&self, base: &CurrencyUnit, term: &CurrencyUnit) -> bool {
        self.read_providers()
            .iter()
            .any(|provider| provider.is_available(base, term))
    }

    fn is_available_at(
        &self,
        base: &CurrencyUnit,
        term: &CurrencyUnit,
        timestamp: DateTime<Utc>,
    ) -> bool {
        self.read_providers()
            .iter()
            .any(|provider| provider.is_available_at(base, term, timestamp))
    }

    fn get_reversed(&self, rate: &ExchangeRate) -> Option<ExchangeRate> {
        self.read_providers()
            .iter()
            .find_map(|provider| provider.get_reversed(rate))
    }

    fn get_converter(self: Arc<Self>) -> Converter {
        Converter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        id: &'static str,
        rate_type: RateType,
        factor: Option<Decimal>,
        call_count: AtomicUsize,
    }

    impl MockProvider {
        fn new(id: &'static str, factor: Option<Decimal>) -> Self {
            Self {
                id,
                rate_type: RateType::REALTIME,
                factor,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    impl RateProvider for MockProvider {
        fn id(&self) -> &str {
            self.id
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
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.factor.map(|factor| {
                ExchangeRate::builder()
                    .rate_type(self.rate_type.clone())
                    .base(base.clone())
                    .term(term.clone())
                    .factor(factor)
                    .provider(self.id)
                    .build()
                    .unwrap()
            })
        }

        fn get_converter(self: Arc<Self>) -> Converter {
            Converter::new(self)
        }
    }

    #[test]
    fn test_first_non_null_child_wins() {
        let a = Arc::new(MockProvider::new("A", None));
        let b = Arc::new(MockProvider::new("B", Some(dec!(0.91))));
        let c = Arc::new(MockProvider::new("C", Some(dec!(0.5))));

        let compound = CompoundProvider::with_providers(
            "COMPOUND",
            RateType::REALTIME,
            vec![
                a.clone() as Arc<dyn RateProvider>,
                b.clone() as Arc<dyn RateProvider>,
                c.clone() as Arc<dyn RateProvider>,
            ],
        )
        .unwrap();

        let rate = compound
            .get_exchange_rate(&CurrencyUnit::CHF, &CurrencyUnit::EUR)
            .unwrap();
        assert_eq!(rate.provider(), "B");
        assert_eq!(rate.factor(), dec!(0.91));
        assert_eq!(a.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(b.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(c.call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_no_child_answers() {
        let compound = CompoundProvider::with_providers(
            "COMPOUND",
            RateType::REALTIME,
            vec![Arc::new(MockProvider::new("A", None)) as Arc<dyn RateProvider>],
        )
        .unwrap();
        assert!(compound
            .get_exchange_rate(&CurrencyUnit::CHF, &CurrencyUnit::EUR)
            .is_none());
        assert!(!compound.is_available(&CurrencyUnit::CHF, &CurrencyUnit::EUR));
    }

    #[test]
    fn test_rejects_incompatible_rate_type() {
        let compound = CompoundProvider::new("COMPOUND", RateType::HISTORIC);
        let result = compound.add_provider(Arc::new(MockProvider::new("A", Some(dec!(1)))));
        assert_eq!(
            result,
            Err(RateError::IncompatibleProvider {
                expected: "HISTORIC".to_string(),
                actual: "REALTIME".to_string(),
            })
        );
        assert!(compound.is_empty());
    }

    #[test]
    fn test_empty_compound() {
        let compound = Arc::new(CompoundProvider::new("COMPOUND", RateType::REALTIME));
        assert!(!compound.is_available(&CurrencyUnit::CHF, &CurrencyUnit::EUR));
        assert!(compound
            .get_reversed(&ExchangeRate::identity(
                RateType::REALTIME,
                CurrencyUnit::CHF,
                "X"
            ))
            .is_none());

        let result = compound
            .get_converter()
            .convert(&Money::new(dec!(100), CurrencyUnit::CHF), &CurrencyUnit::EUR);
        assert!(matches!(result, Err(RateError::NoRateAvailable { .. })));
    }

    #[test]
    fn test_added_provider_is_used_by_later_lookups() {
        let compound = CompoundProvider::new("COMPOUND", RateType::REALTIME);
        assert!(!compound.is_available(&CurrencyUnit::CHF, &CurrencyUnit::EUR));

        compound
            .add_provider(Arc::new(MockProvider::new("LATE", Some(dec!(0.9)))))
            .unwrap();
        assert!(compound.is_available(&CurrencyUnit::CHF, &CurrencyUnit::EUR));
        assert_eq!(compound.len(), 1);
        assert_eq!(compound.providers()[0].id(), "LATE");
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let compound = Arc::new(CompoundProvider::new("COMPOUND", RateType::REALTIME));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let compound = Arc::clone(&compound);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        compound
                            .add_provider(Arc::new(MockProvider::new("P", Some(dec!(1.1)))))
                            .unwrap();
                    } else {
                        for _ in 0..100 {
                            let _ = compound
                                .get_exchange_rate(&CurrencyUnit::USD, &CurrencyUnit::EUR);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(compound.len(), 4);
        assert!(compound.is_available(&CurrencyUnit::USD, &CurrencyUnit::EUR));
    }
}
