//! Engine configuration.
//!
//! Settings come from environment variables ([`EngineConfig::from_env`]) or a
//! JSON document ([`EngineConfig::from_json_str`]). Every field has a default,
//! so an empty document or environment yields a working engine.

use std::time::Duration;

use log::warn;
use ratebridge_rates::provider::imf::{DEFAULT_FEED_URL, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, Result};

const ENV_IMF_ENABLED: &str = "RATEBRIDGE_IMF_ENABLED";
const ENV_IMF_FEED_URL: &str = "RATEBRIDGE_IMF_FEED_URL";
const ENV_IMF_REFRESH_SECS: &str = "RATEBRIDGE_IMF_REFRESH_SECS";
const ENV_IMF_TIMEOUT_SECS: &str = "RATEBRIDGE_IMF_TIMEOUT_SECS";

/// Feed refresh interval: 6 hours. The IMF publishes once per business day.
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 6 * 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub imf: ImfConfig,
}

/// Settings for the IMF time-series provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImfConfig {
    pub enabled: bool,
    pub feed_url: String,
    /// Seconds between refreshes. 0 fetches once at start-up only.
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ImfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: DEFAULT_FEED_URL.to_string(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl ImfConfig {
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EngineConfig {
    /// Reads the configuration from `RATEBRIDGE_*` environment variables.
    ///
    /// Absent variables keep their defaults. Unparsable values are logged and
    /// ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.imf.enabled && self.imf.feed_url.trim().is_empty() {
            return Err(EngineError::Config("imf.feedUrl must not be empty".to_string()));
        }
        if self.imf.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "imf.requestTimeoutSecs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let imf = &mut config.imf;

        if let Some(enabled) = parse_var(&lookup, ENV_IMF_ENABLED, parse_bool) {
            imf.enabled = enabled;
        }
        if let Some(url) = lookup(ENV_IMF_FEED_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            imf.feed_url = url;
        }
        if let Some(secs) = parse_var(&lookup, ENV_IMF_REFRESH_SECS, |v| v.parse::<u64>().ok()) {
            imf.refresh_interval_secs = secs;
        }
        if let Some(secs) = parse_var(&lookup, ENV_IMF_TIMEOUT_SECS, |v| {
            v.parse::<u64>().ok().filter(|secs| *secs > 0)
        }) {
            imf.request_timeout_secs = secs;
        }

        config
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parse(value);
    if parsed.is_none() {
        warn!("Ignoring invalid value '{}' for {}", value, key);
    }
    parsed
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert!(config.imf.enabled);
        assert_eq!(config.imf.feed_url, DEFAULT_FEED_URL);
        assert_eq!(
            config.imf.refresh_interval(),
            Some(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS))
        );
        assert_eq!(config.imf.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_IMF_ENABLED, "false"),
            (ENV_IMF_FEED_URL, " http://localhost:8080/rates.tsv "),
            (ENV_IMF_REFRESH_SECS, "0"),
            (ENV_IMF_TIMEOUT_SECS, "5"),
        ]));
        assert!(!config.imf.enabled);
        assert_eq!(config.imf.feed_url, "http://localhost:8080/rates.tsv");
        assert_eq!(config.imf.refresh_interval(), None);
        assert_eq!(config.imf.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_env_values_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_IMF_ENABLED, "maybe"),
            (ENV_IMF_FEED_URL, "   "),
            (ENV_IMF_REFRESH_SECS, "-1"),
            (ENV_IMF_TIMEOUT_SECS, "0"),
        ]));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_from_json() {
        let config = EngineConfig::from_json_str(
            r#"{ "imf": { "enabled": true, "refreshIntervalSecs": 3600 } }"#,
        )
        .unwrap();
        assert_eq!(config.imf.refresh_interval_secs, 3600);
        assert_eq!(config.imf.feed_url, DEFAULT_FEED_URL);

        assert_eq!(EngineConfig::from_json_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_from_json_rejects_bad_documents() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "imf": { "feedUrl": "" } }"#),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_json_str(r#"{ "imf": { "requestTimeoutSecs": 0 } }"#),
            Err(EngineError::Config(_))
        ));
    }
}
