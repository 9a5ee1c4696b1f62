//! Missing command - analysis and statistics.

use anyhow::Result;
use cardgap_core::MissingAnalyzer;
use clap::Args;
use tracing::info;

use super::{load_cards, load_config, open_service, print_envelope};
use crate::output::Envelope;
use crate::Cli;

/// Arguments for the missing command.
#[derive(Args, Debug, Default)]
pub struct MissingArgs {
    /// Use stored checkpoints only, no network.
    #[arg(long)]
    pub offline: bool,
}

/// Runs the missing command.
pub async fn run(args: &MissingArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;
    let cards = load_cards(&service, args.offline).await?;

    let analyzer = MissingAnalyzer::new(config.target_count);
    let missing = analyzer.analyze(&cards);
    let statistics = MissingAnalyzer::aggregate(&missing);
    info!(
        cards = cards.len(),
        missing = missing.len(),
        target = analyzer.target(),
        "Analysis complete"
    );

    let envelope = Envelope::ok(&missing)?.with("statistics", &statistics)?;
    print_envelope(&envelope, cli)
}
