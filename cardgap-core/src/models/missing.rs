//! Missing-card views.
//!
//! These are computed from enriched cards on every analysis and never
//! persisted:
//! - [`MissingCard`] - One card below the target count
//! - [`AggregateStatistics`] - Totals over a set of missing cards
//! - [`CategoryBreakdown`] - Totals for one rarity or faction

use serde::{Deserialize, Serialize};

// ============================================================================
// Missing Card
// ============================================================================

/// A card the collection holds fewer copies of than the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingCard {
    /// Printed card reference.
    pub reference: String,
    /// Localized card name.
    pub name: String,
    /// Rarity label.
    pub rarity: String,
    /// Faction label.
    pub faction: String,
    /// Copies owned.
    pub owned: u32,
    /// Copies still needed.
    pub missing: u32,
    /// Lowest known unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_price: Option<f64>,
    /// `lower_price * missing`, only when the price is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cost: Option<f64>,
}

impl MissingCard {
    /// Returns true if a unit price is known.
    pub fn is_priced(&self) -> bool {
        self.lower_price.is_some()
    }
}

// ============================================================================
// Aggregate Statistics
// ============================================================================

/// Totals for one category value (a rarity or a faction).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBreakdown {
    /// The category value (e.g. `Rare`, `Axiom`).
    pub category: String,
    /// Number of distinct missing cards.
    pub unique_cards: usize,
    /// Copies missing across those cards.
    pub total_missing: u64,
    /// Cost of the priced cards only.
    pub total_cost: f64,
}

impl CategoryBreakdown {
    /// Creates an empty breakdown for a category.
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            unique_cards: 0,
            total_missing: 0,
            total_cost: 0.0,
        }
    }

    /// Adds one missing card to the totals.
    pub fn add(&mut self, card: &MissingCard) {
        self.unique_cards += 1;
        self.total_missing += u64::from(card.missing);
        if let Some(cost) = card.total_cost {
            self.total_cost += cost;
        }
    }
}

/// Summary over a set of missing cards.
///
/// Costs only ever include cards with a known price; unpriced cards are
/// counted in `unpriced_cards` instead of contributing zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    /// Number of distinct missing cards.
    pub total_unique_cards_missing: usize,
    /// Copies missing in total.
    pub total_cards_missing: u64,
    /// Estimated cost of the priced cards.
    pub total_cost_estimated: f64,
    /// Missing cards with a known price.
    pub cards_with_price: usize,
    /// Missing cards without a price.
    pub cards_without_price: usize,
    /// Per-rarity totals, in first-appearance order.
    pub by_rarity: Vec<CategoryBreakdown>,
    /// Per-faction totals, in first-appearance order.
    pub by_faction: Vec<CategoryBreakdown>,
}

impl AggregateStatistics {
    /// Returns true if no card is missing.
    pub fn is_empty(&self) -> bool {
        self.total_unique_cards_missing == 0
    }

    /// Looks up the breakdown for a rarity.
    pub fn rarity(&self, rarity: &str) -> Option<&CategoryBreakdown> {
        self.by_rarity.iter().find(|b| b.category == rarity)
    }

    /// Looks up the breakdown for a faction.
    pub fn faction(&self, faction: &str) -> Option<&CategoryBreakdown> {
        self.by_faction.iter().find(|b| b.category == faction)
    }
}
