//! Plain text report of missing cards.

use cardgap_core::MissingCard;
use cardgap_core::analysis::group_by;

const WIDTH: usize = 80;

/// Renders missing cards as a report grouped by faction.
pub struct TextFormatter {
    target: u32,
}

impl TextFormatter {
    /// Creates a formatter that prints ownership against `target`.
    pub fn new(target: u32) -> Self {
        Self { target }
    }

    /// One line per card.
    pub fn format_card(&self, card: &MissingCard) -> String {
        let mut line = format!(
            "{:<15} {:<40} {:<12} ({}/{}) -> {} missing",
            card.reference, card.name, card.rarity, card.owned, self.target, card.missing
        );
        if let (Some(unit), Some(total)) = (card.lower_price, card.total_cost) {
            line.push_str(&format!(" - Price: {unit:.2}€/u, Total: {total:.2}€"));
        }
        line
    }

    /// The full report: banner, faction groups in name order, totals.
    pub fn format_missing(&self, missing: &[MissingCard]) -> String {
        let rule = "=".repeat(WIDTH);
        let mut lines = vec![
            rule.clone(),
            "MISSING CARDS - ALTERED TCG".to_string(),
            rule.clone(),
        ];

        let mut groups = group_by(missing, |c| c.faction.as_str());
        groups.sort_by(|a, b| a.0.cmp(b.0));

        for (faction, cards) in groups {
            lines.push(String::new());
            lines.push(format!("[{faction}]"));
            lines.push("-".repeat(WIDTH));
            lines.extend(cards.into_iter().map(|c| self.format_card(c)));
        }

        let to_acquire: u64 = missing.iter().map(|c| u64::from(c.missing)).sum();
        let priced: Vec<f64> = missing.iter().filter_map(|c| c.total_cost).collect();

        lines.push(String::new());
        lines.push(rule.clone());
        lines.push(format!("Total: {} unique cards missing", missing.len()));
        lines.push(format!("Total to acquire: {to_acquire} cards"));
        if !priced.is_empty() {
            let cost: f64 = priced.iter().sum();
            lines.push(format!(
                "Estimated total cost: {cost:.2}€ ({}/{} cards priced)",
                priced.len(),
                missing.len()
            ));
        }
        lines.push(rule);

        lines.join("\n")
    }
}
