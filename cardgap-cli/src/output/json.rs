//! JSON output formatting.

use anyhow::Result;
use cardgap_core::MissingCard;
use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Envelope
// ============================================================================

/// The JSON object every command prints.
///
/// Success carries `data` and/or extra top-level keys; failure carries
/// `error`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Success with a data payload.
    pub fn ok<T: Serialize>(data: T) -> Result<Self> {
        Ok(Self {
            success: true,
            data: Some(serde_json::to_value(data)?),
            error: None,
            extra: Map::new(),
        })
    }

    /// Success with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("message".to_string(), Value::String(message.into()));
        Self {
            success: true,
            data: None,
            error: None,
            extra,
        }
    }

    /// Failure. The error chain is joined into one line.
    pub fn failure(err: &anyhow::Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(format!("{err:#}")),
            extra: Map::new(),
        }
    }

    /// Adds a top-level key next to `data`.
    pub fn with<T: Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        self.extra
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

/// Missing cards as a pretty-printed JSON array.
pub(super) fn export_json(missing: &[MissingCard]) -> Result<String> {
    JsonFormatter::new(true).format(&missing)
}
