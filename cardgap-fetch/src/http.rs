//! HTTP transport for the card API.
//!
//! [`ApiTransport`] is the seam between the fetch logic and the network.
//! [`HttpClient`] implements it with reqwest; tests substitute scripted
//! transports.

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::context::FetchSettings;
use crate::error::FetchError;

// ============================================================================
// Transport Trait
// ============================================================================

/// Issues GET requests against the API and returns parsed JSON bodies.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Performs one GET request.
    ///
    /// # Arguments
    /// * `path` - Path relative to the API base, e.g. `/cards`
    /// * `query` - Query parameters, in order
    ///
    /// # Returns
    /// * `Ok(value)` - 2xx response with a JSON body
    /// * `Err(e)` - Network failure, non-success status, or invalid JSON
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// reqwest-backed transport with timeout, user agent and optional bearer
/// token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    base_url: Url,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client from fetch settings.
    pub fn new(settings: &FetchSettings) -> Result<Self, FetchError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", settings.base_url)))?;

        let inner = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()?;

        Ok(Self {
            inner,
            base_url,
            auth_token: settings.auth_token.clone(),
            timeout: settings.timeout,
        })
    }

    /// Builds the full URL for `path` with `query` appended.
    pub fn url_for(&self, path: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut url =
            Url::parse(&joined).map_err(|e| FetchError::InvalidUrl(format!("{joined}: {e}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    fn map_send_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout.as_secs())
        } else {
            FetchError::Http(error)
        }
    }
}

#[async_trait]
impl ApiTransport for HttpClient {
    #[instrument(skip(self, query), fields(path = %path))]
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = self.url_for(path, query)?;
        debug!(url = %url, "GET request");

        let mut request = self
            .inner
            .get(url)
            .header(header::ACCEPT, "application/ld+json, application/json");
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        let status = response.status();
        debug!(status = %status, "Response received");

        if response.is_rate_limited() {
            return Err(FetchError::RateLimited {
                retry_after: response.retry_after_secs(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::from_status(status.as_u16(), body));
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Check if the response indicates rate limiting.
    fn is_rate_limited(&self) -> bool;

    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn is_rate_limited(&self) -> bool {
        self.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
    }

    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}

// ============================================================================
// Tests
// ============================================================================
