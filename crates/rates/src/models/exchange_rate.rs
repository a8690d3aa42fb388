//! Exchange-rate value object and its builder.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::currency::CurrencyUnit;
use super::rate_type::RateType;
use crate::errors::{RateError, Result};

/// An immutable quote between two currencies: `term = base * factor`.
///
/// A direct rate has no links and its chain is `[self]`. A derived rate keeps
/// the ordered links whose product gave its factor. Links are owned values, so
/// a chain is always finite and can never contain the rate it belongs to.
///
/// Equality and hashing cover the economic meaning of the quote (rate type,
/// currencies, factor, provider, validity window) and ignore the chain, so a
/// derived rate compares equal to a direct quote with the same terms.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    rate_type: RateType,
    base: CurrencyUnit,
    term: CurrencyUnit,
    factor: Decimal,
    provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_from: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_to: Option<DateTime<Utc>>,
    #[serde(rename = "chain", skip_serializing_if = "Vec::is_empty")]
    links: Vec<ExchangeRate>,
}

impl ExchangeRate {
    pub fn builder() -> ExchangeRateBuilder {
        ExchangeRateBuilder::default()
    }

    /// Factor-one rate from a currency to itself, unbounded in time.
    pub fn identity(rate_type: RateType, currency: CurrencyUnit, provider: &str) -> Self {
        Self {
            rate_type,
            base: currency.clone(),
            term: currency,
            factor: Decimal::ONE,
            provider: provider.to_string(),
            valid_from: None,
            valid_to: None,
            links: Vec::new(),
        }
    }

    /// Builds a derived rate from a linked chain.
    ///
    /// The factor is the product of the link factors and the validity window is
    /// the intersection of the link windows. Fails with [`RateError::InvalidRate`]
    /// when the windows do not overlap or the links are not connected.
    pub fn derive(
        rate_type: RateType,
        provider: &str,
        links: Vec<ExchangeRate>,
    ) -> Result<ExchangeRate> {
        let (first, last) = match (links.first(), links.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(RateError::InvalidRate("empty rate chain".to_string())),
        };

        let factor = links
            .iter()
            .try_fold(Decimal::ONE, |acc, link| acc.checked_mul(link.factor))
            .ok_or_else(|| RateError::InvalidRate("chain factor overflow".to_string()))?;
        let valid_from = links.iter().filter_map(|l| l.valid_from).max();
        let valid_to = links.iter().filter_map(|l| l.valid_to).min();

        ExchangeRate::builder()
            .rate_type(rate_type)
            .base(first.base.clone())
            .term(last.term.clone())
            .factor(factor)
            .provider(provider)
            .valid_window(valid_from, valid_to)
            .exchange_rate_chain(links)
            .build()
    }

    pub fn rate_type(&self) -> &RateType {
        &self.rate_type
    }

    pub fn base(&self) -> &CurrencyUnit {
        &self.base
    }

    pub fn term(&self) -> &CurrencyUnit {
        &self.term
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_from
    }

    pub fn valid_to(&self) -> Option<DateTime<Utc>> {
        self.valid_to
    }

    /// The ordered chain of directly quoted rates behind this rate.
    ///
    /// Never empty: a direct rate returns `[self]`.
    pub fn chain(&self) -> Vec<&ExchangeRate> {
        if self.links.is_empty() {
            vec![self]
        } else {
            self.links.iter().collect()
        }
    }

    pub fn is_derived(&self) -> bool {
        !self.links.is_empty()
    }

    /// True when `timestamp` lies within `[valid_from, valid_to]`; absent bounds are open.
    pub fn is_valid(&self, timestamp: DateTime<Utc>) -> bool {
        self.valid_from.map_or(true, |from| from <= timestamp)
            && self.valid_to.map_or(true, |to| to >= timestamp)
    }

    /// The same quote seen from the other side.
    ///
    /// Base and term are swapped, the factor is inverted and the validity window
    /// is kept. The chain is reversed and each link inverted so it stays connected.
    pub fn reciprocal(&self) -> Result<ExchangeRate> {
        let factor = Decimal::ONE.checked_div(self.factor).ok_or_else(|| {
            RateError::InvalidRate(format!("cannot invert factor {}", self.factor))
        })?;
        let links = self
            .links
            .iter()
            .rev()
            .map(ExchangeRate::reciprocal)
            .collect::<Result<Vec<_>>>()?;

        Ok(ExchangeRate {
            rate_type: self.rate_type.clone(),
            base: self.term.clone(),
            term: self.base.clone(),
            factor,
            provider: self.provider.clone(),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            links,
        })
    }

    /// A builder pre-filled with this rate, for producing modified copies.
    pub fn to_builder(&self) -> ExchangeRateBuilder {
        ExchangeRateBuilder {
            rate_type: Some(self.rate_type.clone()),
            base: Some(self.base.clone()),
            term: Some(self.term.clone()),
            factor: Some(self.factor),
            provider: Some(self.provider.clone()),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            chain: self.links.clone(),
        }
    }
}

impl PartialEq for ExchangeRate {
    fn eq(&self, other: &Self) -> bool {
        self.rate_type == other.rate_type
            && self.base == other.base
            && self.term == other.term
            && self.factor == other.factor
            && self.provider == other.provider
            && self.valid_from == other.valid_from
            && self.valid_to == other.valid_to
    }
}

impl Eq for ExchangeRate {}

impl Hash for ExchangeRate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rate_type.hash(state);
        self.base.hash(state);
        self.term.hash(state);
        self.factor.hash(state);
        self.provider.hash(state);
        self.valid_from.hash(state);
        self.valid_to.hash(state);
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {} [{}, {}]",
            self.base, self.term, self.factor, self.rate_type, self.provider
        )
    }
}

/// Builder for [`ExchangeRate`], consumed once by [`build`](Self::build).
///
/// The builder trusts the caller's factor: it checks that a chain is connected
/// but never recomputes the factor from it. Use [`ExchangeRate::derive`] to have
/// the factor computed.
#[derive(Debug, Default, Clone)]
pub struct ExchangeRateBuilder {
    rate_type: Option<RateType>,
    base: Option<CurrencyUnit>,
    term: Option<CurrencyUnit>,
    factor: Option<Decimal>,
    provider: Option<String>,
    valid_from: Option<DateTime<Utc>>,
    valid_to: Option<DateTime<Utc>>,
    chain: Vec<ExchangeRate>,
}

impl ExchangeRateBuilder {
    pub fn rate_type(mut self, rate_type: RateType) -> Self {
        self.rate_type = Some(rate_type);
        self
    }

    pub fn base(mut self, base: CurrencyUnit) -> Self {
        self.base = Some(base);
        self
    }

    pub fn term(mut self, term: CurrencyUnit) -> Self {
        self.term = Some(term);
        self
    }

    pub fn factor(mut self, factor: Decimal) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn valid_from(mut self, valid_from: DateTime<Utc>) -> Self {
        self.valid_from = Some(valid_from);
        self
    }

    pub fn valid_to(mut self, valid_to: DateTime<Utc>) -> Self {
        self.valid_to = Some(valid_to);
        self
    }

    pub fn valid_window(
        mut self,
        valid_from: Option<DateTime<Utc>>,
        valid_to: Option<DateTime<Utc>>,
    ) -> Self {
        self.valid_from = valid_from;
        self.valid_to = valid_to;
        self
    }

    /// Validity of one calendar day: from `date` 00:00 UTC to the next day 00:00 UTC.
    pub fn valid_on(self, date: NaiveDate) -> Self {
        let from = date.and_time(chrono::NaiveTime::MIN).and_utc();
        let to = date
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(chrono::NaiveTime::MIN).and_utc());
        self.valid_window(Some(from), to)
    }

    /// Stores the chain in the given order.
    ///
    /// Zero or one link leaves the rate direct (its chain is `[self]`).
    pub fn exchange_rate_chain(mut self, rates: impl IntoIterator<Item = ExchangeRate>) -> Self {
        self.chain = rates.into_iter().collect();
        self
    }

    /// True when every required field (rate type, base, term, factor) is set.
    pub fn is_buildable(&self) -> bool {
        self.first_missing().is_none()
    }

    fn first_missing(&self) -> Option<&'static str> {
        if self.rate_type.is_none() {
            Some("rate_type")
        } else if self.base.is_none() {
            Some("base")
        } else if self.term.is_none() {
            Some("term")
        } else if self.factor.is_none() {
            Some("factor")
        } else {
            None
        }
    }

    pub fn build(self) -> Result<ExchangeRate> {
        let missing = self.first_missing();
        let (rate_type, base, term, factor) =
            match (self.rate_type, self.base, self.term, self.factor) {
                (Some(rate_type), Some(base), Some(term), Some(factor)) => {
                    (rate_type, base, term, factor)
                }
                _ => {
                    return Err(RateError::IncompleteRate {
                        missing: missing.unwrap_or("factor"),
                    })
                }
            };

        if factor <= Decimal::ZERO {
            return Err(RateError::InvalidRate(format!(
                "factor must be positive, got {}",
                factor
            )));
        }

        if let (Some(from), Some(to)) = (self.valid_from, self.valid_to) {
            if from > to {
                return Err(RateError::InvalidRate(format!(
                    "validity window is empty: {} > {}",
                    from.to_rfc3339(),
                    to.to_rfc3339()
                )));
            }
        }

        let links = if self.chain.len() > 1 {
            check_chain(&base, &term, &self.chain)?;
            self.chain
        } else {
            Vec::new()
        };

        Ok(ExchangeRate {
            rate_type,
            base,
            term,
            factor,
            provider: self.provider.unwrap_or_default(),
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            links,
        })
    }
}

fn check_chain(base: &CurrencyUnit, term: &CurrencyUnit, chain: &[ExchangeRate]) -> Result<()> {
    if let Some(first) = chain.first() {
        if first.base != *base {
            return Err(RateError::InvalidRate(format!(
                "chain starts at {} but rate base is {}",
                first.base, base
            )));
        }
    }
    if let Some(last) = chain.last() {
        if last.term != *term {
            return Err(RateError::InvalidRate(format!(
                "chain ends at {} but rate term is {}",
                last.term, term
            )));
        }
    }
    for pair in chain.windows(2) {
        if pair[0].term != pair[1].base {
            return Err(RateError::InvalidRate(format!(
                "chain is broken between {} and {}",
                pair[0], pair[1]
            )));
        }
    }
    Ok(())
}
