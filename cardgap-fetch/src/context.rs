//! Fetch settings and context.
//!
//! The fetch context bundles what every fetch needs: settings, a
//! transport, and the checkpoint store. It is built once and passed
//! explicitly; there is no global client.

use std::sync::Arc;
use std::time::Duration;

use cardgap_store::{AppConfig, CheckpointStore};

use crate::error::FetchError;
use crate::http::{ApiTransport, HttpClient};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.altered.gg";

/// Default locale.
pub const DEFAULT_LOCALE: &str = "fr-fr";

/// User agent string for cardgap.
const USER_AGENT: &str = concat!("cardgap/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// API base URL.
    pub base_url: String,
    /// Bearer token forwarded on every request.
    pub auth_token: Option<String>,
    /// Timeout for a single request.
    pub timeout: Duration,
    /// Items requested per page.
    pub page_size: u32,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Locale used when the caller does not pass one.
    pub locale: String,
    /// User agent header.
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout: Duration::from_secs(30),
            page_size: 100,
            page_delay: Duration::from_millis(500),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            locale: DEFAULT_LOCALE.to_string(),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    /// Builds settings from the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_url.clone(),
            auth_token: config.auth_token.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            page_size: config.page_size.max(1),
            page_delay: Duration::from_millis(config.page_delay_ms),
            max_attempts: config.max_attempts,
            locale: config.locale.clone(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the inter-page delay.
    #[must_use]
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Returns the retry policy these settings describe.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Everything a fetch needs.
#[derive(Clone)]
pub struct FetchContext {
    /// Fetch settings.
    pub settings: FetchSettings,
    /// Transport used for every request.
    pub transport: Arc<dyn ApiTransport>,
    /// Checkpoint store.
    pub store: CheckpointStore,
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl FetchContext {
    /// Creates a context that talks to the API over HTTP.
    pub fn new(settings: FetchSettings, store: CheckpointStore) -> Result<Self, FetchError> {
        let http = HttpClient::new(&settings)?;
        Ok(Self::with_transport(settings, Arc::new(http), store))
    }

    /// Creates a context with a custom transport.
    pub fn with_transport(
        settings: FetchSettings,
        transport: Arc<dyn ApiTransport>,
        store: CheckpointStore,
    ) -> Self {
        Self {
            settings,
            transport,
            store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FetchSettings::default();
        assert_eq!(settings.base_url, "https://api.altered.gg");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.page_delay, Duration::from_millis(500));
        assert_eq!(settings.retry_policy().max_attempts, 3);
        assert!(settings.user_agent.starts_with("cardgap/"));
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            api_url: "http://localhost:9000".to_string(),
            auth_token: Some("tok".to_string()),
            locale: "en-us".to_string(),
            page_size: 0,
            page_delay_ms: 0,
            ..AppConfig::default()
        };
        let settings = FetchSettings::from_config(&config);
        assert_eq!(settings.base_url, "http://localhost:9000");
        assert_eq!(settings.auth_token.as_deref(), Some("tok"));
        assert_eq!(settings.locale, "en-us");
        assert_eq!(settings.page_size, 1);
        assert_eq!(settings.page_delay, Duration::ZERO);
    }

    #[test]
    fn test_context_over_http() {
        let ctx = FetchContext::new(FetchSettings::default(), CheckpointStore::in_memory());
        assert!(ctx.is_ok());
    }
}
