//! Missing-card analysis.
//!
//! For every enriched card, computes how many copies are needed to reach a
//! target count and what they would cost at the lowest known price.

use std::collections::HashMap;

use crate::models::{AggregateStatistics, Card, CategoryBreakdown, MissingCard};

/// Copies of each card a complete playset holds.
pub const DEFAULT_TARGET_COUNT: u32 = 3;

/// Computes missing cards against a target count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingAnalyzer {
    target: u32,
}

impl MissingAnalyzer {
    /// Creates an analyzer with a custom target count.
    pub fn new(target: u32) -> Self {
        Self { target }
    }

    /// Returns the target count.
    pub fn target(&self) -> u32 {
        self.target
    }

    /// Returns the missing-card view for one card, or `None` if the card is
    /// already at or above the target.
    pub fn missing_for(&self, card: &Card) -> Option<MissingCard> {
        let owned = card.owned();
        let missing = owned.missing_from(self.target);
        if missing == 0 {
            return None;
        }

        // Unbounded ownership never reaches this point.
        let owned = owned.count().unwrap_or(self.target);
        let total_cost = card.lower_price.map(|price| price * f64::from(missing));

        Some(MissingCard {
            reference: card.reference.clone(),
            name: card.name.clone(),
            rarity: card.rarity_label().to_string(),
            faction: card.faction_label().to_string(),
            owned,
            missing,
            lower_price: card.lower_price,
            total_cost,
        })
    }

    /// Returns the missing cards, in input order.
    pub fn analyze(&self, cards: &[Card]) -> Vec<MissingCard> {
        cards.iter().filter_map(|card| self.missing_for(card)).collect()
    }

    /// Summarizes a set of missing cards.
    pub fn aggregate(missing: &[MissingCard]) -> AggregateStatistics {
        let cards_with_price = missing.iter().filter(|c| c.is_priced()).count();

        AggregateStatistics {
            total_unique_cards_missing: missing.len(),
            total_cards_missing: missing.iter().map(|c| u64::from(c.missing)).sum(),
            total_cost_estimated: missing.iter().filter_map(|c| c.total_cost).sum(),
            cards_with_price,
            cards_without_price: missing.len() - cards_with_price,
            by_rarity: breakdown(missing, |c| c.rarity.as_str()),
            by_faction: breakdown(missing, |c| c.faction.as_str()),
        }
    }
}

impl Default for MissingAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_COUNT)
    }
}

/// Groups missing cards by a category, keeping first-appearance order of the
/// groups and input order within each group.
pub fn group_by<'a, F>(missing: &'a [MissingCard], key: F) -> Vec<(&'a str, Vec<&'a MissingCard>)>
where
    F: Fn(&'a MissingCard) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&MissingCard>)> = Vec::new();

    for card in missing {
        let category = key(card);
        let slot = *index.entry(category).or_insert_with(|| {
            groups.push((category, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(card);
    }
    groups
}

fn breakdown<'a, F>(missing: &'a [MissingCard], key: F) -> Vec<CategoryBreakdown>
where
    F: Fn(&'a MissingCard) -> &'a str,
{
    group_by(missing, key)
        .into_iter()
        .map(|(category, cards)| {
            let mut totals = CategoryBreakdown::new(category);
            for card in cards {
                totals.add(card);
            }
            totals
        })
        .collect()
}
