//! Engine start-up.
//!
//! Wires the built-in providers from an [`EngineConfig`]: the IMF time-series
//! provider (when enabled) with its background refresh task, and the identity
//! provider.

use std::sync::Arc;

use log::info;
use ratebridge_rates::{
    FeedSource, HttpFeedSource, IdentityRateProvider, ImfRateProvider, RateProvider,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::engine::ConversionEngine;
use crate::errors::{EngineError, Result};

/// A running engine together with the background work it owns.
///
/// Dropping the handle stops the feed refresh task. The engine itself stays
/// usable through any [`Arc`] clones, serving the last loaded rates.
pub struct EngineHandle {
    engine: Arc<ConversionEngine>,
    imf: Option<Arc<ImfRateProvider>>,
    refresh_task: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn engine(&self) -> &Arc<ConversionEngine> {
        &self.engine
    }

    /// The IMF provider, when enabled.
    pub fn imf(&self) -> Option<&Arc<ImfRateProvider>> {
        self.imf.as_ref()
    }

    /// Stops the feed refresh task.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            info!("Stopping IMF refresh task");
            task.abort();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builds an engine from `config`, fetching the IMF feed over HTTP.
///
/// With the IMF provider enabled this must run inside a tokio runtime;
/// otherwise it fails with [`EngineError::Config`].
pub fn bootstrap(config: &EngineConfig) -> Result<EngineHandle> {
    config.validate()?;
    let source = Arc::new(HttpFeedSource::new(
        config.imf.feed_url.clone(),
        config.imf.request_timeout(),
    ));
    bootstrap_with_source(config, source)
}

/// Builds an engine from `config`, reading the IMF feed from `source`.
///
/// Same runtime requirement as [`bootstrap`].
pub fn bootstrap_with_source(
    config: &EngineConfig,
    source: Arc<dyn FeedSource>,
) -> Result<EngineHandle> {
    config.validate()?;

    let mut providers: Vec<Arc<dyn RateProvider>> = Vec::new();
    let mut imf = None;
    let mut refresh_task = None;

    if config.imf.enabled {
        if Handle::try_current().is_err() {
            return Err(EngineError::Config(
                "the IMF provider needs a tokio runtime for its refresh task".to_string(),
            ));
        }
        let provider = Arc::new(ImfRateProvider::new());
        info!(
            "Starting IMF provider from '{}' (refresh interval: {:?})",
            source.name(),
            config.imf.refresh_interval()
        );
        refresh_task = Some(provider.spawn_refresh(source, config.imf.refresh_interval()));
        providers.push(provider.clone());
        imf = Some(provider);
    } else {
        info!("IMF provider disabled");
    }
    providers.push(Arc::new(IdentityRateProvider::new()));

    let engine = ConversionEngine::new(providers)?;
    Ok(EngineHandle {
        engine: Arc::new(engine),
        imf,
        refresh_task,
    })
}
