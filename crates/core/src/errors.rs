//! Error types for the conversion engine.

use ratebridge_rates::{RateError, RateType};
use thiserror::Error;

/// Type alias for Result using the engine error type.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by the [`ConversionEngine`](crate::ConversionEngine) facade.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// No provider is registered for the requested rate type
    #[error("Rate type '{0}' is not supported")]
    UnsupportedRateType(RateType),

    #[error(transparent)]
    Rate(#[from] RateError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
