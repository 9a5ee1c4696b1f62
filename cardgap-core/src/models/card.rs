//! Card records as delivered by the remote API.
//!
//! Cards arrive from two paginated resources: the card catalog (details,
//! tags) and the collection stats (owned count, lowest price). Both are
//! keyed by the remote `@id`. Fields this crate does not interpret are kept
//! in a flattened map so a card survives a checkpoint round-trip intact.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Marker the API uses for an unlimited owned count.
pub const UNBOUNDED_MARKER: &str = "∞";

/// Label used when a card carries no usable rarity or faction.
const UNKNOWN_LABEL: &str = "Unknown";

// ============================================================================
// Ownership
// ============================================================================

/// How many copies of a card the collection holds.
///
/// The API reports either a number or the [`UNBOUNDED_MARKER`] string.
/// The unbounded case is a distinct variant, never a large number, so that
/// deficit and cost arithmetic cannot be fed an infinite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    /// A finite number of copies.
    Count(u32),
    /// Unlimited copies.
    Unbounded,
}

impl Ownership {
    /// Interprets a raw API value.
    ///
    /// Non-negative numbers become [`Ownership::Count`] (fractions are
    /// truncated), the unbounded marker becomes [`Ownership::Unbounded`],
    /// and anything else counts as zero.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if s == UNBOUNDED_MARKER => Self::Unbounded,
            Value::Number(n) => {
                if let Some(count) = n.as_u64() {
                    Self::Count(u32::try_from(count).unwrap_or(u32::MAX))
                } else {
                    match n.as_f64() {
                        Some(f) if f.is_finite() && f >= 0.0 => {
                            Self::Count(f.min(f64::from(u32::MAX)) as u32)
                        }
                        _ => Self::Count(0),
                    }
                }
            }
            _ => Self::Count(0),
        }
    }

    /// Returns the finite count, if any.
    pub fn count(self) -> Option<u32> {
        match self {
            Self::Count(n) => Some(n),
            Self::Unbounded => None,
        }
    }

    /// Returns true for the unbounded sentinel.
    pub fn is_unbounded(self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Copies still needed to reach `target`. Unbounded ownership needs none.
    pub fn missing_from(self, target: u32) -> u32 {
        match self {
            Self::Count(n) => target.saturating_sub(n),
            Self::Unbounded => 0,
        }
    }
}

impl Default for Ownership {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str(UNBOUNDED_MARKER),
        }
    }
}

impl Serialize for Ownership {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Count(n) => serializer.serialize_u32(*n),
            Self::Unbounded => serializer.serialize_str(UNBOUNDED_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Ownership {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

// ============================================================================
// Card Tag
// ============================================================================

/// A rarity, card type, or faction reference attached to a card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardTag {
    /// Stable reference (e.g. `COMMON`, `AX`).
    #[serde(default, deserialize_with = "deserialize_text")]
    pub reference: String,
    /// Localized display name.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    /// Other fields (colors, ids) kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardTag {
    /// Creates a tag with a reference and a name.
    pub fn new(reference: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            name: name.into(),
            extra: Map::new(),
        }
    }

    /// Builds a tag from an IRI such as `/rarities/COMMON`.
    ///
    /// The last path segment becomes the reference; the IRI is kept as `@id`.
    pub fn from_iri(iri: &str) -> Self {
        let reference = iri.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default();
        let mut tag = Self::new(reference, "");
        tag.extra.insert("@id".to_string(), Value::String(iri.to_string()));
        tag
    }

    /// Display label: the name, else the reference, else `None`.
    pub fn label(&self) -> Option<&str> {
        if !self.name.is_empty() {
            Some(&self.name)
        } else if !self.reference.is_empty() {
            Some(&self.reference)
        } else {
            None
        }
    }
}

fn tag_label(tag: Option<&CardTag>) -> &str {
    tag.and_then(CardTag::label).unwrap_or(UNKNOWN_LABEL)
}

// ============================================================================
// Card
// ============================================================================

/// A card record.
///
/// `collection_count` and `lower_price` are filled in by
/// [`enrich_cards`](crate::enrich::enrich_cards); a card straight from the
/// catalog usually has neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Remote identifier (`@id`), shared with [`CardStat`].
    #[serde(rename = "@id", default, deserialize_with = "deserialize_text")]
    pub id: String,
    /// Printed reference (e.g. `ALT_CORE_B_AX_04_C`).
    #[serde(default, deserialize_with = "deserialize_text")]
    pub reference: String,
    /// Localized name.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    /// Rarity tag.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_tag")]
    pub rarity: Option<CardTag>,
    /// Card type tag.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_tag")]
    pub card_type: Option<CardTag>,
    /// Main faction tag.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_tag")]
    pub main_faction: Option<CardTag>,
    /// Image URL.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_text"
    )]
    pub image_path: Option<String>,
    /// Owned copies, set by enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_count: Option<Ownership>,
    /// Owned copies as reported on the card itself, if the API sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership: Option<Ownership>,
    /// Lowest market price, set by enrichment.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_price"
    )]
    pub lower_price: Option<f64>,
    /// All other fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Card {
    /// Creates a card with the given identifier, reference, and name.
    pub fn new(id: impl Into<String>, reference: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reference: reference.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Decodes a card from a raw API record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] when the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::InvalidRecord(format!(
                "expected card object, got {value}"
            )));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Sets the rarity tag.
    #[must_use]
    pub fn with_rarity(mut self, tag: CardTag) -> Self {
        self.rarity = Some(tag);
        self
    }

    /// Sets the main faction tag.
    #[must_use]
    pub fn with_faction(mut self, tag: CardTag) -> Self {
        self.main_faction = Some(tag);
        self
    }

    /// Sets the owned count.
    #[must_use]
    pub fn with_collection_count(mut self, owned: Ownership) -> Self {
        self.collection_count = Some(owned);
        self
    }

    /// Sets the lowest price.
    #[must_use]
    pub fn with_lower_price(mut self, price: f64) -> Self {
        self.lower_price = Some(price);
        self
    }

    /// Effective owned count.
    ///
    /// A non-zero `collection_count` wins; otherwise the card's own
    /// `ownership` field is used; otherwise zero.
    pub fn owned(&self) -> Ownership {
        match self.collection_count {
            Some(owned) if owned != Ownership::Count(0) => owned,
            _ => self.ownership.unwrap_or_default(),
        }
    }

    /// Rarity label, or `Unknown`.
    pub fn rarity_label(&self) -> &str {
        tag_label(self.rarity.as_ref())
    }

    /// Faction label, or `Unknown`.
    pub fn faction_label(&self) -> &str {
        tag_label(self.main_faction.as_ref())
    }
}

// ============================================================================
// Card Stat
// ============================================================================

/// Per-card collection statistics from the stats resource.
///
/// Values are kept raw; [`enrich_cards`](crate::enrich::enrich_cards)
/// decides how to read them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStat {
    /// Remote identifier (`@id`), shared with [`Card`].
    #[serde(rename = "@id", default, deserialize_with = "deserialize_text")]
    pub id: String,
    /// Owned count: a number or the unbounded marker.
    #[serde(default)]
    pub in_my_collection: Value,
    /// Lowest market price.
    #[serde(default)]
    pub lower_price: Value,
    /// All other fields, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardStat {
    /// Creates a stat record.
    pub fn new(id: impl Into<String>, in_my_collection: Value, lower_price: Value) -> Self {
        Self {
            id: id.into(),
            in_my_collection,
            lower_price,
            extra: Map::new(),
        }
    }

    /// Owned count as reported.
    pub fn ownership(&self) -> Ownership {
        Ownership::from_value(&self.in_my_collection)
    }

    /// Lowest price, if it is a finite number.
    pub fn price(&self) -> Option<f64> {
        finite_number(&self.lower_price)
    }
}

fn finite_number(value: &Value) -> Option<f64> {
    value.as_f64().filter(|f| f.is_finite())
}

// Field readers below never fail: a null or mistyped field reads as absent.

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(finite_number(&value))
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(value).unwrap_or_default())
}

fn deserialize_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(text_of(value))
}

fn deserialize_tag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<CardTag>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        Value::String(iri) if !iri.is_empty() => Some(CardTag::from_iri(&iri)),
        _ => None,
    })
}
