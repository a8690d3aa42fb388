//! Parser for the IMF representative-rates feed.
//!
//! The feed is a tab-separated table in two sections:
//!
//! ```text
//! SDRs per Currency unit
//! Currency        January 31, 2013    January 30, 2013
//! Euro            0.8791              0.8802
//! U.S. dollar     0.649148            0.650112
//!
//! Currency units per SDR
//! Currency        January 31, 2013    January 30, 2013
//! Euro            1.13752             1.13611
//! U.S. dollar     1.54048             1.53820
//! ```
//!
//! "SDRs per Currency unit" rows quote currency -> SDR, "Currency units per SDR"
//! rows quote SDR -> currency; the cell value is the factor. Lines without tabs
//! are split on commas instead. Unknown currency names are skipped.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

use super::names::currency_for_name;
use crate::errors::FeedError;
use crate::models::{CurrencyUnit, ExchangeRate, RateType};

const REFERENCE_PER_CURRENCY_HEADER: &str = "sdrs per currency unit";
const CURRENCY_PER_REFERENCE_HEADER: &str = "currency units per sdr";
const DATE_HEADER: &str = "currency";

/// Cell markers for a missing quote.
const MISSING_VALUES: &[&str] = &["", "NA", "N/A", "-"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    CurrencyToReference,
    ReferenceToCurrency,
}

/// Per-currency quote lists against the reference unit, ascending by `valid_from`.
#[derive(Debug, Default)]
pub struct ParsedFeed {
    pub currency_to_reference: HashMap<CurrencyUnit, Vec<ExchangeRate>>,
    pub reference_to_currency: HashMap<CurrencyUnit, Vec<ExchangeRate>>,
    /// Display names that did not match any known currency.
    pub skipped_names: BTreeSet<String>,
}

impl ParsedFeed {
    pub fn rate_count(&self) -> usize {
        self.currency_to_reference
            .values()
            .chain(self.reference_to_currency.values())
            .map(Vec::len)
            .sum()
    }
}

/// Parses a whole feed. Any malformed line fails the whole parse.
pub fn parse_feed(
    text: &str,
    reference: &CurrencyUnit,
    rate_type: &RateType,
    provider: &str,
) -> Result<ParsedFeed, FeedError> {
    let mut parsed = ParsedFeed::default();
    let mut section: Option<Section> = None;
    let mut dates: Vec<Option<NaiveDate>> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let cells = split_cells(line);
        let first = cells.first().map(|c| c.trim()).unwrap_or_default();
        let lowered = first.to_lowercase();

        if lowered.starts_with(REFERENCE_PER_CURRENCY_HEADER) {
            section = Some(Section::CurrencyToReference);
            dates.clear();
            continue;
        }
        if lowered.starts_with(CURRENCY_PER_REFERENCE_HEADER) {
            section = Some(Section::ReferenceToCurrency);
            dates.clear();
            continue;
        }
        if lowered == DATE_HEADER {
            dates = cells[1..]
                .iter()
                .map(|cell| parse_date(cell.trim(), line_no))
                .collect::<Result<_, _>>()?;
            continue;
        }

        let Some(currency) = currency_for_name(first) else {
            debug!("Skipping feed line {}: unknown currency name '{}'", line_no, first);
            parsed.skipped_names.insert(first.to_string());
            continue;
        };

        let Some(section) = section else {
            return Err(FeedError::parse(
                line_no,
                format!("quote for {} before any section header", currency),
            ));
        };
        if dates.is_empty() {
            return Err(FeedError::parse(
                line_no,
                format!("quote for {} before the date header", currency),
            ));
        }

        let (base, term, target) = match section {
            Section::CurrencyToReference => (
                currency.clone(),
                reference.clone(),
                &mut parsed.currency_to_reference,
            ),
            Section::ReferenceToCurrency => (
                reference.clone(),
                currency.clone(),
                &mut parsed.reference_to_currency,
            ),
        };

        for (col, cell) in cells[1..].iter().enumerate() {
            let Some(factor) = parse_value(cell.trim(), line_no)? else {
                continue;
            };
            let date = dates.get(col).copied().flatten().ok_or_else(|| {
                FeedError::parse(line_no, format!("value in column {} has no date", col + 2))
            })?;

            let rate = ExchangeRate::builder()
                .rate_type(rate_type.clone())
                .base(base.clone())
                .term(term.clone())
                .factor(factor)
                .provider(provider)
                .valid_on(date)
                .build()
                .map_err(|e| FeedError::parse(line_no, e.to_string()))?;
            target.entry(currency.clone()).or_default().push(rate);
        }
    }

    for list in parsed
        .currency_to_reference
        .values_mut()
        .chain(parsed.reference_to_currency.values_mut())
    {
        list.sort_by_key(|r| r.valid_from());
    }

    if parsed.rate_count() == 0 {
        return Err(FeedError::Empty);
    }
    Ok(parsed)
}

fn split_cells(line: &str) -> Vec<&str> {
    if line.contains('\t') {
        line.split('\t').collect()
    } else {
        line.split(',').collect()
    }
}

fn parse_date(cell: &str, line_no: usize) -> Result<Option<NaiveDate>, FeedError> {
    if cell.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(cell, "%B %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(cell, "%Y-%m-%d"))
        .map(Some)
        .map_err(|_| FeedError::parse(line_no, format!("invalid date '{}'", cell)))
}

fn parse_value(cell: &str, line_no: usize) -> Result<Option<Decimal>, FeedError> {
    if MISSING_VALUES.iter().any(|m| cell.eq_ignore_ascii_case(m)) {
        return Ok(None);
    }
    let digits: String = cell.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&digits)
        .or_else(|_| Decimal::from_scientific(&digits))
        .map(Some)
        .map_err(|_| FeedError::parse(line_no, format!("invalid value '{}'", cell)))
}
