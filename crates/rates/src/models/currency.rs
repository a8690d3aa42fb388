use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::errors::RateError;

/// Currency code (ISO 4217 style, three ASCII letters, upper case).
///
/// Codes used as constants are borrowed statics; codes parsed at runtime are owned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyUnit(Cow<'static, str>);

impl CurrencyUnit {
    /// IMF Special Drawing Rights, the reference unit of the IMF feed.
    pub const XDR: CurrencyUnit = CurrencyUnit(Cow::Borrowed("XDR"));
    pub const USD: CurrencyUnit = CurrencyUnit(Cow::Borrowed("USD"));
    pub const EUR: CurrencyUnit = CurrencyUnit(Cow::Borrowed("EUR"));
    pub const CHF: CurrencyUnit = CurrencyUnit(Cow::Borrowed("CHF"));
    pub const GBP: CurrencyUnit = CurrencyUnit(Cow::Borrowed("GBP"));
    pub const JPY: CurrencyUnit = CurrencyUnit(Cow::Borrowed("JPY"));

    /// Creates a unit from a static code known to be valid.
    pub const fn from_static(code: &'static str) -> Self {
        CurrencyUnit(Cow::Borrowed(code))
    }

    /// Parses and normalizes a currency code.
    pub fn new(code: &str) -> Result<Self, RateError> {
        let trimmed = code.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RateError::InvalidCurrency(code.to_string()));
        }
        Ok(CurrencyUnit(Cow::Owned(trimmed.to_ascii_uppercase())))
    }

    pub fn code(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyUnit {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyUnit::new(s)
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CurrencyUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
