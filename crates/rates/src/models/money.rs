use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::currency::CurrencyUnit;

/// Immutable monetary amount: a decimal value tagged with its currency.
///
/// No rounding is ever applied here; the decimal keeps whatever scale the
/// arithmetic produced.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    currency: CurrencyUnit,
    amount: Decimal,
}

impl Money {
    pub fn new(amount: Decimal, currency: CurrencyUnit) -> Self {
        Self { currency, amount }
    }

    pub fn currency(&self) -> &CurrencyUnit {
        &self.currency
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Rounds to `dp` decimal places, for callers that want a rounding post-step.
    pub fn round_dp(&self, dp: u32) -> Self {
        Self {
            currency: self.currency.clone(),
            amount: self.amount.round_dp(dp),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
