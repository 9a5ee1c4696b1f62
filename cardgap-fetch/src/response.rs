//! Page response decoding.
//!
//! The API answers list endpoints either with a bare JSON array or with an
//! envelope object (Hydra style or plain). Both decode into
//! [`PageResponse`]; anything else is [`FetchError::MalformedResponse`].

use serde_json::{Map, Value};

use crate::error::FetchError;

/// Keys that may hold the item array, in lookup order.
const ITEM_KEYS: [&str; 3] = ["hydra:member", "member", "cards"];

/// Keys that may hold the collection total, in lookup order.
const TOTAL_KEYS: [&str; 2] = ["hydra:totalItems", "totalItems"];

/// One decoded page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    /// A bare array. The collection total is unknown.
    Bare(Vec<Value>),
    /// An envelope with items and the collection total.
    Enveloped {
        /// Items on this page.
        items: Vec<Value>,
        /// Items in the whole collection.
        total_items: u64,
    },
}

impl PageResponse {
    /// Decodes a response body.
    pub fn from_value(body: Value) -> Result<Self, FetchError> {
        match body {
            Value::Array(items) => Ok(Self::Bare(items)),
            Value::Object(mut map) => {
                let items = take_items(&mut map)?;
                let total_items = total_items(&map).ok_or_else(|| {
                    FetchError::MalformedResponse("envelope without total item count".to_string())
                })?;
                Ok(Self::Enveloped { items, total_items })
            }
            other => Err(FetchError::MalformedResponse(format!(
                "expected array or object, got {}",
                kind(&other)
            ))),
        }
    }

    /// Splits into items and optional total.
    pub fn into_parts(self) -> (Vec<Value>, Option<u64>) {
        match self {
            Self::Bare(items) => (items, None),
            Self::Enveloped { items, total_items } => (items, Some(total_items)),
        }
    }
}

fn take_items(map: &mut Map<String, Value>) -> Result<Vec<Value>, FetchError> {
    for key in ITEM_KEYS {
        match map.remove(key) {
            Some(Value::Array(items)) => return Ok(items),
            Some(other) => {
                return Err(FetchError::MalformedResponse(format!(
                    "`{key}` is {}, expected array",
                    kind(&other)
                )));
            }
            None => {}
        }
    }
    Err(FetchError::MalformedResponse(
        "items array not found".to_string(),
    ))
}

fn total_items(map: &Map<String, Value>) -> Option<u64> {
    TOTAL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_u64))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_array() {
        let page = PageResponse::from_value(json!([{"@id": "/cards/1"}])).unwrap();
        let (items, total) = page.into_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(total, None);
    }

    #[test]
    fn test_hydra_envelope() {
        let page = PageResponse::from_value(json!({
            "@context": "/contexts/Card",
            "hydra:member": [{"@id": "/cards/1"}, {"@id": "/cards/2"}],
            "hydra:totalItems": 250
        }))
        .unwrap();
        let (items, total) = page.into_parts();
        assert_eq!(items.len(), 2);
        assert_eq!(total, Some(250));
    }

    #[test]
    fn test_plain_envelopes() {
        let page = PageResponse::from_value(json!({"member": [], "totalItems": 0})).unwrap();
        assert_eq!(page, PageResponse::Enveloped { items: vec![], total_items: 0 });

        let page = PageResponse::from_value(json!({"cards": [1, 2, 3], "totalItems": 3})).unwrap();
        let (items, total) = page.into_parts();
        assert_eq!(items.len(), 3);
        assert_eq!(total, Some(3));
    }

    #[test]
    fn test_missing_items_is_malformed() {
        let err = PageResponse::from_value(json!({"totalItems": 3})).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_non_array_items_is_malformed() {
        let err = PageResponse::from_value(json!({"hydra:member": {}, "hydra:totalItems": 1}))
            .unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_envelope_without_total_is_malformed() {
        let err = PageResponse::from_value(json!({"hydra:member": []})).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_scalar_is_malformed() {
        assert!(matches!(
            PageResponse::from_value(json!("hello")),
            Err(FetchError::MalformedResponse(_))
        ));
    }
}
