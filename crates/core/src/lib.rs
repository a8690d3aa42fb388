//! Ratebridge Core - Conversion engine, configuration and start-up.
//!
//! This crate puts the providers from `ratebridge-rates` behind a single
//! facade keyed by rate type. Providers are injected explicitly; there is no
//! global registry.
//!
//! ```ignore
//! let handle = ratebridge_core::bootstrap(&EngineConfig::from_env())?;
//! let eur = handle.engine().convert(
//!     &Money::new(dec!(100), CurrencyUnit::USD),
//!     &CurrencyUnit::EUR,
//!     &RateType::HISTORIC,
//! )?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod engine;
pub mod errors;
pub mod lazy;

pub use bootstrap::{bootstrap, bootstrap_with_source, EngineHandle};
pub use config::{EngineConfig, ImfConfig};
pub use engine::ConversionEngine;
pub use lazy::{LazyConverter, TimestampBinding};

// Re-export error types
pub use errors::EngineError;
pub use errors::Result;
