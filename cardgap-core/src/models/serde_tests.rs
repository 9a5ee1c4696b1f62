//! Serde serialization/deserialization tests for core types.
//!
//! These tests pin the JSON shapes the API sends and the shapes the
//! checkpoint files and exports rely on.

use serde_json::{json, Value};

use crate::{
    AggregateStatistics, Card, CardStat, CardTag, FilterData, MissingCard, Ownership, UserInfo,
};

// ============================================================================
// Card Serde Tests
// ============================================================================

#[test]
fn test_card_decodes_api_shape() {
    let raw = json!({
        "@id": "/cards/ALT_CORE_B_AX_04_C",
        "@type": "Card",
        "reference": "ALT_CORE_B_AX_04_C",
        "name": "Vaike, l'Énergéticienne",
        "rarity": {"reference": "COMMON", "name": "Commune"},
        "cardType": {"reference": "CHARACTER", "name": "Personnage"},
        "mainFaction": {"reference": "AX", "name": "Axiom", "color": "#8c432a"},
        "imagePath": "https://example.test/ax04.jpg",
        "elements": {"MAIN_COST": "2"}
    });

    let card: Card = serde_json::from_value(raw).unwrap();

    assert_eq!(card.id, "/cards/ALT_CORE_B_AX_04_C");
    assert_eq!(card.rarity_label(), "Commune");
    assert_eq!(card.faction_label(), "Axiom");
    assert_eq!(card.card_type.as_ref().unwrap().reference, "CHARACTER");
    assert_eq!(
        card.main_faction.as_ref().unwrap().extra.get("color"),
        Some(&json!("#8c432a"))
    );
    assert_eq!(card.extra.get("@type"), Some(&json!("Card")));
    assert!(card.extra.contains_key("elements"));
    assert_eq!(card.collection_count, None);
}

#[test]
fn test_card_roundtrip_preserves_unknown_fields() {
    let raw = json!({
        "@id": "/cards/1",
        "reference": "REF-1",
        "name": "One",
        "loreEntries": ["a", "b"],
        "isSuspended": false
    });

    let card: Card = serde_json::from_value(raw.clone()).unwrap();
    let back = serde_json::to_value(&card).unwrap();

    assert_eq!(back, raw);
}

#[test]
fn test_enriched_card_serializes_unbounded_marker() {
    let card = Card::new("/cards/1", "REF-1", "One").with_collection_count(Ownership::Unbounded);
    let value = serde_json::to_value(&card).unwrap();
    assert_eq!(value["collectionCount"], json!("∞"));

    let parsed: Card = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.collection_count, Some(Ownership::Unbounded));
}

#[test]
fn test_card_tag_roundtrip() {
    let tag = CardTag::new("RARE", "Rare");
    let json = serde_json::to_string(&tag).unwrap();
    let parsed: CardTag = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, tag);
}

// ============================================================================
// CardStat Serde Tests
// ============================================================================

#[test]
fn test_card_stat_decodes_api_shape() {
    let raw = json!({
        "@id": "/cards/1",
        "inMyCollection": 2,
        "lowerPrice": 0.35,
        "isExclusive": false
    });

    let stat: CardStat = serde_json::from_value(raw).unwrap();
    assert_eq!(stat.ownership(), Ownership::Count(2));
    assert_eq!(stat.price(), Some(0.35));
}

#[test]
fn test_card_stat_missing_fields_default() {
    let stat: CardStat = serde_json::from_value(json!({"@id": "/cards/1"})).unwrap();
    assert_eq!(stat.in_my_collection, Value::Null);
    assert_eq!(stat.ownership(), Ownership::Count(0));
    assert_eq!(stat.price(), None);
}

// ============================================================================
// MissingCard Serde Tests
// ============================================================================

#[test]
fn test_missing_card_camel_case() {
    let card = MissingCard {
        reference: "REF-1".to_string(),
        name: "One".to_string(),
        rarity: "Rare".to_string(),
        faction: "Lyra".to_string(),
        owned: 1,
        missing: 2,
        lower_price: Some(1.25),
        total_cost: Some(2.5),
    };

    let value = serde_json::to_value(&card).unwrap();
    assert_eq!(value["lowerPrice"], json!(1.25));
    assert_eq!(value["totalCost"], json!(2.5));

    let parsed: MissingCard = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, card);
}

#[test]
fn test_missing_card_without_price_omits_fields() {
    let card = MissingCard {
        reference: "REF-2".to_string(),
        name: "Two".to_string(),
        rarity: "Common".to_string(),
        faction: "Ordis".to_string(),
        owned: 0,
        missing: 3,
        lower_price: None,
        total_cost: None,
    };

    let value = serde_json::to_value(&card).unwrap();
    assert!(value.get("lowerPrice").is_none());
    assert!(value.get("totalCost").is_none());

    let parsed: MissingCard = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, card);
}

#[test]
fn test_aggregate_statistics_field_names() {
    let stats = AggregateStatistics {
        total_unique_cards_missing: 1,
        total_cards_missing: 2,
        total_cost_estimated: 0.5,
        cards_with_price: 1,
        cards_without_price: 0,
        by_rarity: Vec::new(),
        by_faction: Vec::new(),
    };
    let value = serde_json::to_value(&stats).unwrap();
    assert!(value.get("totalUniqueCardsMissing").is_some());
    assert!(value.get("cardsWithoutPrice").is_some());
    assert!(value.get("byFaction").is_some());
}

// ============================================================================
// Account Payload Tests
// ============================================================================

#[test]
fn test_user_info_keeps_extra_fields() {
    let user: UserInfo = serde_json::from_value(json!({
        "id": "u-1",
        "email": "player@example.test",
        "username": "player",
        "locale": "fr-fr"
    }))
    .unwrap();
    assert_eq!(user.username, "player");
    assert_eq!(user.extra.get("locale"), Some(&json!("fr-fr")));
}

#[test]
fn test_filter_data_accepts_objects_and_strings() {
    let filters: FilterData = serde_json::from_value(json!({
        "rarities": ["COMMON", {"reference": "RARE", "name": "Rare"}],
        "factions": ["AX"],
        "sets": ["CORE"]
    }))
    .unwrap();
    assert_eq!(filters.rarities.len(), 2);
    assert!(filters.types.is_empty());
    assert!(filters.extra.contains_key("sets"));
}
