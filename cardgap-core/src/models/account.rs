//! One-shot API payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The authenticated user, as returned by `/me`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account identifier.
    #[serde(default)]
    pub id: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// All other fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Filter metadata, as returned by `/cards/filter-data`.
///
/// Entries are kept as raw JSON since the API mixes plain strings and
/// objects depending on locale and version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterData {
    /// Available rarities.
    #[serde(default)]
    pub rarities: Vec<Value>,
    /// Available card types.
    #[serde(default)]
    pub types: Vec<Value>,
    /// Available factions.
    #[serde(default)]
    pub factions: Vec<Value>,
    /// All other filter groups, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
