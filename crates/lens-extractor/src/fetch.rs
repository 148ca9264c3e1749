//! HTTP page fetcher
//!
//! Retries live here and nowhere else: the strategy chain never re-runs a
//! strategy, it moves on to the next one.

use crate::error::ExtractorError;
use crate::profile::Profile;
use crate::source::{HtmlSource, JsonSource, LayeredSource};
use lens_domain::SourceAccessor;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default per-request timeout (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 4;

const PRIMARY_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15";

const ALTERNATE_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Fetches pages and API payloads with browser-like headers
pub struct PageFetcher {
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl PageFetcher {
    /// Create a fetcher with the default timeout and retry count
    pub fn new() -> Result<Self, ExtractorError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher with a custom per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, ExtractorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractorError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Set the number of attempts per request (at least one)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the first backoff delay; it doubles after every failed attempt
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Fetch an HTML page
    ///
    /// An HTTP error status is retried once with a different User-Agent.
    pub async fn fetch(&self, url: &str) -> Result<HtmlSource, ExtractorError> {
        let (status, body) = self.get(url, PRIMARY_AGENT, HTML_ACCEPT).await?;
        info!("HTTP status {} for {}", status, url);

        if !status.is_client_error() && !status.is_server_error() {
            return Ok(HtmlSource::new(url, body));
        }

        warn!("Got status {} for {}, retrying with another User-Agent", status, url);
        let (status, body) = self.get(url, ALTERNATE_AGENT, HTML_ACCEPT).await?;
        if status.is_client_error() || status.is_server_error() {
            return Err(ExtractorError::SourceUnavailable {
                target: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        Ok(HtmlSource::new(url, body))
    }

    /// Fetch a JSON API payload
    pub async fn fetch_json(&self, url: &str) -> Result<JsonSource, ExtractorError> {
        let (status, body) = self.get(url, PRIMARY_AGENT, "application/json").await?;
        if !status.is_success() {
            return Err(ExtractorError::SourceUnavailable {
                target: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }
        JsonSource::parse(url, &body).map_err(|e| ExtractorError::SourceUnavailable {
            target: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Fetch everything a profile knows how to read for a product URL
    ///
    /// The product API payload (when the profile has one) is layered in front
    /// of the page. Either one failing is tolerated; both failing is not.
    pub async fn fetch_for(&self, profile: &Profile, url: &str) -> Result<LayeredSource, ExtractorError> {
        let mut layers: Vec<Arc<dyn SourceAccessor>> = Vec::new();
        let mut failures = Vec::new();

        if let Some(api_url) = profile.api_url_for(url) {
            match self.fetch_json(&api_url).await {
                Ok(api) => layers.push(Arc::new(api)),
                Err(e) => {
                    warn!("Product API unavailable for {}: {}", url, e);
                    failures.push(e.to_string());
                }
            }
        }

        match self.fetch(url).await {
            Ok(page) => layers.push(Arc::new(page)),
            Err(e) => {
                warn!("Page unavailable: {}", e);
                failures.push(e.to_string());
            }
        }

        if layers.is_empty() {
            return Err(ExtractorError::SourceUnavailable {
                target: url.to_string(),
                reason: failures.join("; "),
            });
        }
        Ok(LayeredSource::new(url, layers))
    }

    /// GET with retries and exponential backoff (1s, 2s, 4s, ...)
    async fn get(&self, url: &str, agent: &str, accept: &str) -> Result<(StatusCode, String), ExtractorError> {
        let mut delay = self.base_delay;
        let mut last_error = String::new();

        for attempt in 1..=self.max_retries {
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, agent)
                .header(ACCEPT, accept)
                .header(ACCEPT_LANGUAGE, "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7")
                .header(REFERER, "https://www.google.com/")
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    match response.text().await {
                        Ok(body) => {
                            debug!("Fetched {} bytes from {}", body.len(), url);
                            return Ok((status, body));
                        }
                        Err(e) => last_error = format!("Failed to read body: {}", e),
                    }
                }
                Err(e) => last_error = format!("Request failed: {}", e),
            }

            warn!(
                "Request error for {} (attempt {}/{}): {}",
                url, attempt, self.max_retries, last_error
            );
            if attempt < self.max_retries {
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
        }

        Err(ExtractorError::SourceUnavailable {
            target: url.to_string(),
            reason: last_error,
        })
    }
}
