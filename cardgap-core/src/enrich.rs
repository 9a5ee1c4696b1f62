//! Merging card details with collection stats.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::models::{Card, CardStat};

/// Decodes raw API records, skipping (and logging) the ones that do not fit.
///
/// A single odd record in a multi-thousand item collection should not sink
/// the whole analysis.
pub fn decode_records<T: DeserializeOwned>(values: Vec<Value>, kind: &str) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(kind = %kind, index, error = %e, "Skipping undecodable record");
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(kind = %kind, skipped = total - decoded.len(), total, "Some records were skipped");
    }
    decoded
}

/// Attaches owned count and lowest price from `stats` to each card.
///
/// Cards are matched on `@id`. When several stats share an id the last one
/// wins. A card without stats keeps zero ownership and no price; it is never
/// dropped. Input order is preserved.
pub fn enrich_cards(cards: Vec<Card>, stats: &[CardStat]) -> Vec<Card> {
    let by_id: HashMap<&str, &CardStat> = stats.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut matched = 0usize;
    let enriched: Vec<Card> = cards
        .into_iter()
        .map(|mut card| {
            let stat = by_id.get(card.id.as_str());
            if stat.is_some() {
                matched += 1;
            }
            card.collection_count = Some(stat.map(|s| s.ownership()).unwrap_or_default());
            card.lower_price = stat.and_then(|s| s.price());
            card
        })
        .collect();

    debug!(
        cards = enriched.len(),
        stats = stats.len(),
        matched,
        unmatched = enriched.len() - matched,
        "Enriched cards with collection stats"
    );
    enriched
}
