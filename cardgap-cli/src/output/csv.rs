//! CSV export.

use anyhow::{Result, anyhow};
use cardgap_core::MissingCard;
use ::csv::{QuoteStyle, WriterBuilder};

const HEADER: [&str; 8] = [
    "Reference",
    "Name",
    "Rarity",
    "Faction",
    "Owned",
    "Missing",
    "Unit Price",
    "Total Cost",
];

const UNPRICED: &str = "N/A";

fn price_cell(price: Option<f64>) -> String {
    price.map_or_else(|| UNPRICED.to_string(), |p| format!("{p:.2}"))
}

/// Missing cards as CSV, one row per card, every field quoted.
pub(super) fn export_csv(missing: &[MissingCard]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for card in missing {
        writer.write_record([
            card.reference.clone(),
            card.name.clone(),
            card.rarity.clone(),
            card.faction.clone(),
            card.owned.to_string(),
            card.missing.to_string(),
            price_cell(card.lower_price),
            price_cell(card.total_cost),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}
