//! Error types for the rates crate.
//!
//! This module provides:
//! - [`RateError`]: contract errors raised by the builder, the compound provider
//!   and the converters
//! - [`FeedError`]: ingestion failures of time-series feeds, which are never
//!   surfaced through lookup methods

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Type alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, RateError>;

/// Errors raised by exchange-rate construction, provider registration and conversion.
///
/// Absence of a quote is not an error for lookups: providers return `None`.
/// Only converters turn a missing rate into [`RateError::NoRateAvailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RateError {
    /// The builder was asked to build without one of its required fields.
    #[error("Incomplete exchange rate: missing {missing}")]
    IncompleteRate {
        /// Name of the first missing field
        missing: &'static str,
    },

    /// The builder inputs violate an exchange-rate invariant.
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    /// A provider with a different rate type was added to a compound provider.
    #[error("Incompatible provider: expected rate type {expected}, got {actual}")]
    IncompatibleProvider {
        /// Rate type served by the compound provider
        expected: String,
        /// Rate type declared by the rejected provider
        actual: String,
    },

    /// A converter could not resolve any rate for the requested pair.
    #[error("No exchange rate available for {base} -> {term}{}", fmt_timestamp(.timestamp))]
    NoRateAvailable {
        /// Currency being converted from
        base: String,
        /// Currency being converted to
        term: String,
        /// Timestamp the lookup was made for, if any
        timestamp: Option<DateTime<Utc>>,
    },

    /// Applying a rate overflowed the decimal range.
    #[error("Conversion overflow: {0}")]
    Overflow(String),

    /// A currency code could not be parsed.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),
}

fn fmt_timestamp(timestamp: &Option<DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => format!(" at {}", ts.to_rfc3339()),
        None => String::new(),
    }
}

/// Errors raised while fetching or parsing a rate feed.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The feed could not be retrieved.
    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    /// A network error occurred while downloading the feed.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed content is malformed.
    #[error("Feed parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the feed
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The feed parsed but contained no usable rates.
    #[error("Feed contained no rates")]
    Empty,
}

impl FeedError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
