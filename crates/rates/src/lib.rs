//! Ratebridge Rates Crate
//!
//! Exchange-rate data model, rate providers and converters.
//!
//! # Overview
//!
//! - [`ExchangeRate`] - Immutable quote `term = base * factor`, optionally derived
//!   from a chain of quotes, with an optional validity window
//! - [`RateProvider`] - Capability trait answering availability and rate lookups
//! - [`CompoundProvider`] - Several providers of one rate type, first answer wins
//! - [`ImfRateProvider`] - SDR time series with cross-rate derivation
//! - [`Converter`] - Applies a resolved rate to a [`Money`] amount
//!
//! # Architecture
//!
//! ```text
//!   Money --> Converter --> RateProvider ----------------------+
//!                               |                              |
//!               +---------------+----------------+             |
//!               |               |                |             |
//!        StaticRateProvider  CompoundProvider  ImfRateProvider |
//!                               |                |             |
//!                         (children, in      base -> XDR       |
//!                          registration        x               |
//!                          order)            XDR -> term       |
//!                                                |             |
//!                                          ExchangeRate <------+
//! ```
//!
//! Lookups never fail: a missing quote is `None`. Errors are reserved for
//! contract violations ([`RateError`]) and for feed ingestion ([`FeedError`]).

pub mod conversion;
pub mod errors;
pub mod models;
pub mod provider;

pub use conversion::{apply_rate, Converter};
pub use errors::{FeedError, RateError, Result};
pub use models::{CurrencyUnit, ExchangeRate, ExchangeRateBuilder, Money, RateType};
pub use provider::imf::{
    FeedSource, FeedSummary, HttpFeedSource, ImfRateProvider, StaticFeedSource,
};
pub use provider::{CompoundProvider, IdentityRateProvider, RateProvider, StaticRateProvider};
