//! Cards command - every card, enriched.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_cards, load_config, open_service, print_envelope};
use crate::output::Envelope;
use crate::Cli;

/// Arguments for the cards command.
#[derive(Args, Debug, Default)]
pub struct CardsArgs {
    /// Use stored checkpoints only, no network.
    #[arg(long)]
    pub offline: bool,
}

/// Runs the cards command.
pub async fn run(args: &CardsArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;

    let cards = load_cards(&service, args.offline).await?;
    info!(count = cards.len(), "Cards loaded");

    let envelope = Envelope::ok(&cards)?.with("count", cards.len())?;
    print_envelope(&envelope, cli)
}
