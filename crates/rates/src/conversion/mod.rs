//! Currency conversion.
//!
//! A [`Converter`] applies rates resolved from a bound provider to monetary
//! amounts. The arithmetic is a single multiplication by the rate factor.

mod converter;

pub use converter::{apply_rate, Converter};
