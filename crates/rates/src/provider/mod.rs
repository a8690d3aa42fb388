//! Rate provider abstractions and implementations.
//!
//! This module contains:
//! - The `RateProvider` trait that all providers implement
//! - `StaticRateProvider`: a single-source provider over in-memory quotes
//! - `IdentityRateProvider`: factor-one rates from a currency to itself
//! - `CompoundProvider`: several providers of one rate type behind one interface
//! - `imf`: the IMF time-series provider with cross-rate derivation
//!
//! # Architecture
//!
//! Providers are injected explicitly by the application. There is no global
//! registry; the conversion engine groups the providers it is given by rate type.

mod compound;
mod identity;
pub mod imf;
mod static_provider;
mod traits;

pub use compound::CompoundProvider;
pub use identity::IdentityRateProvider;
pub use static_provider::StaticRateProvider;
pub use traits::RateProvider;
