//! Exchange-rate models
//!
//! This module contains the core value types:
//! - `currency` - Currency codes (CurrencyUnit)
//! - `rate_type` - Quotation regimes (RateType)
//! - `money` - Monetary amounts (Money)
//! - `exchange_rate` - Quotes between currencies and their builder

mod currency;
mod exchange_rate;
mod money;
mod rate_type;

pub use currency::CurrencyUnit;
pub use exchange_rate::{ExchangeRate, ExchangeRateBuilder};
pub use money::Money;
pub use rate_type::RateType;
