//! Core error types for `cardgap`.

use thiserror::Error;

/// Core error type for `cardgap` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record could not be interpreted as the expected type.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
