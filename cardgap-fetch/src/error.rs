//! Fetch error types.

use cardgap_store::StoreError;
use thiserror::Error;

/// Error type for fetch operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a status was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after: Option<u64>,
    },

    /// The API rejected the request (4xx other than 429).
    #[error("Client error {status}: {message}")]
    Client {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The API failed to serve the request (5xx).
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        message: String,
    },

    /// The body parsed as JSON but has an unexpected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Another fetch of the same resource is running.
    #[error("Fetch already in progress for {0}")]
    AlreadyInFlight(String),

    /// Offline mode found no checkpoint for a required resource.
    #[error("No cached data for {0}")]
    NotCached(String),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Maximum characters of a response body kept in an error message.
const MESSAGE_LIMIT: usize = 200;

impl FetchError {
    /// Builds the error for a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let mut message: String = message.into();
        if let Some((idx, _)) = message.char_indices().nth(MESSAGE_LIMIT) {
            message.truncate(idx);
        }

        match status {
            429 => Self::RateLimited { retry_after: None },
            400..=499 => Self::Client { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// Returns the HTTP status this error carries, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Client { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
