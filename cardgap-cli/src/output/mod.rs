//! Output formatting for CLI.
//!
//! Every command answers with a JSON [`Envelope`]. The export command can
//! also render missing cards as a JSON document, a CSV sheet, or a plain
//! text report grouped by faction.

mod csv;
mod json;
mod text;

use anyhow::Result;
use cardgap_core::MissingCard;
use std::fmt;

pub use json::{Envelope, JsonFormatter};
pub use text::TextFormatter;


// ============================================================================
// Export Format
// ============================================================================

/// Document formats the export command can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON array.
    Json,
    /// Quoted CSV with a header row.
    Csv,
    /// Human-readable report grouped by faction.
    Text,
}

impl ExportFormat {
    /// Parses a format name. Unknown names fall back to JSON.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "txt" | "text" => Self::Text,
            _ => Self::Json,
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }

    /// Suggested file name for the exported document.
    pub fn default_filename(self) -> String {
        format!("missing_cards.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Renders missing cards in the given format.
///
/// `target` is only used by the text report, which prints `owned/target`.
pub fn export(missing: &[MissingCard], format: ExportFormat, target: u32) -> Result<String> {
    match format {
        ExportFormat::Json => json::export_json(missing),
        ExportFormat::Csv => csv::export_csv(missing),
        ExportFormat::Text => Ok(TextFormatter::new(target).format_missing(missing)),
    }
}
