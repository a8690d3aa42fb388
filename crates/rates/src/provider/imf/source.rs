//! Feed sources for the IMF provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::errors::FeedError;

/// IMF representative rates for the last five days, tab-separated.
pub const DEFAULT_FEED_URL: &str = "https://www.imf.org/external/np/fin/data/rms_five.aspx?tsvflag=Y";

/// Default HTTP request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the raw feed text comes from.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<String, FeedError>;
}

/// Downloads the feed over HTTP.
pub struct HttpFeedSource {
    client: Client,
    url: String,
}

impl HttpFeedSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for HttpFeedSource {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_URL, DEFAULT_REQUEST_TIMEOUT)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<String, FeedError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Fetch(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }
        Ok(response.text().await?)
    }
}

/// Serves a fixed feed text, for offline use and tests.
pub struct StaticFeedSource {
    name: String,
    text: String,
}

impl StaticFeedSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<String, FeedError> {
        Ok(self.text.clone())
    }
}
