//! IMF time-series provider.
//!
//! Ingests the IMF representative-rates feed, which quotes every currency
//! against the SDR (`XDR`) in both directions, and derives cross rates by
//! chaining `base -> XDR` with `XDR -> term`.
//!
//! # Data lifecycle
//!
//! Each successful refresh parses the whole feed into fresh tables and swaps
//! them in as a unit. A feed that fails to parse is discarded and the previous
//! tables keep serving. Before the first successful refresh every lookup
//! returns `None`.
//!
//! # Timestamp lookups
//!
//! A lookup with a timestamp returns the oldest quote whose validity window
//! contains it. When no window matches, the oldest quote for the currency is
//! returned instead of `None`. This fallback is intentional: the feed only
//! covers a few recent days and callers get an approximate historic rate rather
//! than a failed conversion. It does mean a timestamp far outside the covered
//! days silently gets stale data; check the returned rate's validity window
//! when that matters. Validity bounds are inclusive, so an instant at exactly
//! midnight matches the preceding day's quote first.
//!
//! A lookup without a timestamp returns the most recent quote. For a cross
//! rate that is the most recent day quoted for both currencies, so a gap in
//! one currency's series does not hide the rate. When the two currencies share
//! no day at all, the term leg is looked up at the base leg's day.

mod names;
mod parser;
mod source;

pub use names::currency_for_name;
pub use parser::{parse_feed, ParsedFeed};
pub use source::{
    FeedSource, HttpFeedSource, StaticFeedSource, DEFAULT_FEED_URL, DEFAULT_REQUEST_TIMEOUT,
};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

use crate::conversion::Converter;
use crate::errors::FeedError;
use crate::models::{CurrencyUnit, ExchangeRate, RateType};
use crate::provider::RateProvider;

/// Provider ID constant
const PROVIDER_ID: &str = "IMF";

/// Live rate tables, replaced wholesale on every successful refresh.
#[derive(Debug, Default)]
struct RateTables {
    currency_to_reference: HashMap<CurrencyUnit, Vec<ExchangeRate>>,
    reference_to_currency: HashMap<CurrencyUnit, Vec<ExchangeRate>>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedSummary {
    /// Currencies with at least one quote
    pub currencies: usize,
    /// Quotes ingested across both directions
    pub rates: usize,
    /// Feed names that matched no known currency
    pub skipped: Vec<String>,
}

/// Exchange rates derived from the IMF SDR time series.
pub struct ImfRateProvider {
    rate_type: RateType,
    reference: CurrencyUnit,
    tables: RwLock<Arc<RateTables>>,
}

impl ImfRateProvider {
    /// Creates a provider with empty tables. Feed data arrives through
    /// [`load_feed`](Self::load_feed), [`refresh`](Self::refresh) or
    /// [`spawn_refresh`](Self::spawn_refresh).
    pub fn new() -> Self {
        Self {
            rate_type: RateType::HISTORIC,
            reference: CurrencyUnit::XDR,
            tables: RwLock::new(Arc::new(RateTables::default())),
        }
    }

    /// Creates the provider and starts fetching in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(source: Arc<dyn FeedSource>, interval: Option<Duration>) -> Arc<Self> {
        let provider = Arc::new(Self::new());
        provider.spawn_refresh(source, interval);
        provider
    }

    /// The reference unit all quotes are expressed against.
    pub fn reference(&self) -> &CurrencyUnit {
        &self.reference
    }

    /// Parses `text` and, if the whole feed is valid, publishes it.
    pub fn load_feed(&self, text: &str) -> Result<FeedSummary, FeedError> {
        let parsed = parse_feed(text, &self.reference, &self.rate_type, PROVIDER_ID)?;

        let currencies: BTreeSet<&CurrencyUnit> = parsed
            .currency_to_reference
            .keys()
            .chain(parsed.reference_to_currency.keys())
            .collect();
        let summary = FeedSummary {
            currencies: currencies.len(),
            rates: parsed.rate_count(),
            skipped: parsed.skipped_names.iter().cloned().collect(),
        };

        let tables = RateTables {
            currency_to_reference: parsed.currency_to_reference,
            reference_to_currency: parsed.reference_to_currency,
            loaded_at: Some(Utc::now()),
        };
        self.publish(tables);

        if !summary.skipped.is_empty() {
            warn!(
                "IMF feed: skipped {} rows with unknown currency names",
                summary.skipped.len()
            );
        }
        info!(
            "IMF feed loaded: {} rates for {} currencies",
            summary.rates, summary.currencies
        );
        Ok(summary)
    }

    /// Fetches the feed from `source` and loads it.
    ///
    /// No lock is held while fetching, so lookups keep serving the current
    /// tables. On failure the current tables stay in place.
    pub async fn refresh(&self, source: &dyn FeedSource) -> Result<FeedSummary, FeedError> {
        debug!("Fetching IMF feed from '{}'", source.name());
        let text = source.fetch().await.map_err(|e| {
            warn!("IMF feed fetch from '{}' failed: {}", source.name(), e);
            e
        })?;
        self.load_feed(&text).map_err(|e| {
            error!("IMF feed from '{}' rejected: {}", source.name(), e);
            e
        })
    }

    /// Refreshes in a background task: once immediately, then every `interval`
    /// if one is given. Failures are logged and the task keeps going.
    ///
    /// The task holds a weak reference and stops once the provider is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        source: Arc<dyn FeedSource>,
        interval: Option<Duration>,
    ) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            info!("IMF refresh task started for '{}'", source.name());
            let mut ticker = interval.map(tokio::time::interval);

            loop {
                if let Some(ticker) = ticker.as_mut() {
                    ticker.tick().await;
                }
                let Some(provider) = weak.upgrade() else {
                    debug!("IMF provider dropped, stopping refresh task");
                    return;
                };
                // errors are already logged by refresh
                let _ = provider.refresh(source.as_ref()).await;
                drop(provider);

                if ticker.is_none() {
                    return;
                }
            }
        })
    }

    /// Currencies with at least one quote, sorted.
    pub fn currencies(&self) -> Vec<CurrencyUnit> {
        let tables = self.snapshot();
        let set: BTreeSet<CurrencyUnit> = tables
            .currency_to_reference
            .keys()
            .chain(tables.reference_to_currency.keys())
            .cloned()
            .collect();
        set.into_iter().collect()
    }

    /// When the live tables were published, if ever.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.snapshot().loaded_at
    }

    fn snapshot(&self) -> Arc<RateTables> {
        let guard = self.tables.read().unwrap_or_else(|poisoned| {
            warn!("IMF table lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Arc::clone(&guard)
    }

    fn publish(&self, tables: RateTables) {
        let mut guard = self.tables.write().unwrap_or_else(|poisoned| {
            warn!("IMF table lock was poisoned, recovering");
            poisoned.into_inner()
        });
        *guard = Arc::new(tables);
    }

    /// Picks the quote for `timestamp` from an ascending list.
    ///
    /// Falls back to the oldest quote when no window contains the timestamp;
    /// see the module documentation.
    fn lookup_rate(
        list: &[ExchangeRate],
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<&ExchangeRate> {
        match timestamp {
            Some(ts) => list.iter().find(|r| r.is_valid(ts)).or_else(|| {
                debug!("No IMF quote valid at {}, falling back to oldest", ts);
                list.first()
            }),
            None => list.last(),
        }
    }

    /// Newest pair of quotes from the two legs starting on the same day.
    ///
    /// Without a shared day, pairs the base leg's newest quote with the term
    /// quote for that day (or the term fallback).
    fn latest_common<'a>(
        to_reference: &'a [ExchangeRate],
        from_reference: &'a [ExchangeRate],
    ) -> Option<(&'a ExchangeRate, &'a ExchangeRate)> {
        let shared = to_reference.iter().rev().find_map(|to| {
            from_reference
                .iter()
                .rev()
                .find(|from| from.valid_from() == to.valid_from())
                .map(|from| (to, from))
        });
        if shared.is_some() {
            return shared;
        }

        let to = to_reference.last()?;
        let from = Self::lookup_rate(from_reference, to.valid_from())?;
        Some((to, from))
    }
}

impl Default for ImfRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RateProvider for ImfRateProvider {
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
        timestamp: Option<DateTime<Utc>>,
    ) -> Option<ExchangeRate> {
        let tables = self.snapshot();

        if *base == self.reference {
            let list = tables.reference_to_currency.get(term)?;
            return Self::lookup_rate(list, timestamp).cloned();
        }
        if *term == self.reference {
            let list = tables.currency_to_reference.get(base)?;
            return Self::lookup_rate(list, timestamp).cloned();
        }

        let to_list = tables.currency_to_reference.get(base)?;
        let from_list = tables.reference_to_currency.get(term)?;
        let (to_reference, from_reference) = match timestamp {
            Some(_) => (
                Self::lookup_rate(to_list, timestamp)?,
                Self::lookup_rate(from_list, timestamp)?,
            ),
            None => Self::latest_common(to_list, from_list)?,
        };

        // Disjoint validity windows yield no rate rather than an empty window.
        match ExchangeRate::derive(
            self.rate_type.clone(),
            PROVIDER_ID,
            vec![to_reference.clone(), from_reference.clone()],
        ) {
            Ok(rate) => Some(rate),
            Err(e) => {
                debug!("Cannot derive {} -> {} via {}: {}", base, term, self.reference, e);
                None
            }
        }
    }

    fn get_reversed(&self, rate: &ExchangeRate) -> Option<ExchangeRate> {
        self.exchange_rate(rate.term(), rate.base(), rate.valid_from())
    }

    fn get_converter(self: Arc<Self>) -> Converter {
        Converter::new(self)
    }
}
