//! HTTP client for menu listing pages and documents
//!
//! Browser-like default headers, retry on configured status codes and
//! network errors with exponential backoff, `Retry-After` honoured.

use crate::infrastructure::config::{defaults, HttpClientSettings};
use crate::infrastructure::parsing_error::ParsingError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Source of raw documents; implemented by [`HttpClient`] and by test doubles
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch a page as text
    async fn fetch_text(&self, url: &str) -> Result<String>;

    /// Fetch a binary document such as a PDF
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// HTTP client with built-in retry policy
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    settings: HttpClientSettings,
    /// Optional context label for provenance in logs (e.g. the source name)
    context_label: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client from settings
    pub fn with_settings(settings: HttpClientSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static(defaults::ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language)
                .context("Invalid Accept-Language header value")?,
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .user_agent(&settings.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            settings,
            context_label: None,
        })
    }

    /// Set a human-readable context label for logging provenance (returns self for chaining)
    pub fn with_context_label(mut self, label: &str) -> Self {
        self.context_label = Some(label.to_string());
        self
    }

    fn label(&self) -> &str {
        self.context_label.as_deref().unwrap_or("http")
    }

    fn is_retryable(&self, status: StatusCode) -> bool {
        self.settings.retry_statuses.contains(&status.as_u16())
    }

    /// Wait before retry number `retry` (1-based): `factor * 2^(retry-1)` plus jitter
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let base = self.settings.backoff_factor_ms.saturating_mul(1_u64 << exponent);
        let jitter = fastrand::u64(0..=self.settings.backoff_factor_ms / 10);
        Duration::from_millis(base.saturating_add(jitter).min(self.settings.max_backoff_ms))
    }

    fn retry_after(&self, response: &Response) -> Option<Duration> {
        let seconds = response
            .headers()
            .get(header::RETRY_AFTER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        Some(Duration::from_millis(
            seconds.saturating_mul(1000).min(self.settings.max_backoff_ms),
        ))
    }

    /// Fetch response with retry policy based on HTTP status codes and network errors
    pub async fn fetch_response_with_policy(&self, url: &str) -> Result<Response> {
        let attempts = self.settings.max_retries + 1;
        let mut last_err: Option<anyhow::Error> = None;

        for attempt in 1..=attempts {
            info!("🌐 [{}] HTTP GET (attempt {}/{}): {}", self.label(), attempt, attempts, url);
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }

                    let failure = ParsingError::HttpRequestFailed {
                        status: status.as_u16(),
                        message: status.canonical_reason().unwrap_or("unknown").to_string(),
                        url: url.to_string(),
                    };
                    if !self.is_retryable(status) || attempt == attempts {
                        error!("❌ [{}] HTTP error {} on attempt {}: {}", self.label(), status, attempt, url);
                        return Err(failure.into());
                    }

                    let delay = self
                        .retry_after(&resp)
                        .map_or_else(|| self.backoff_delay(attempt), |d| d.max(self.backoff_delay(attempt)));
                    warn!("⚠️ [{}] HTTP {} for {}, retrying in {:?}", self.label(), status, url, delay);
                    last_err = Some(failure.into());
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!("⚠️ [{}] Network error on attempt {}: {}", self.label(), attempt, e);
                    last_err = Some(anyhow!("HTTP request failed for {}: {}", url, e));
                    if attempt < attempts {
                        sleep(self.backoff_delay(attempt)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Unknown HTTP error for {}", url)))
    }
}

#[async_trait]
impl DocumentFetcher for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.fetch_response_with_policy(url).await?;
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!("[{}] fetched {} bytes of text from {}", self.label(), body.len(), url);
        Ok(body)
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.fetch_response_with_policy(url).await?;
        let body = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        if body.is_empty() {
            return Err(anyhow!("Empty response from {}", url));
        }
        debug!("[{}] fetched {} bytes from {}", self.label(), body.len(), url);
        Ok(body.to_vec())
    }
}
