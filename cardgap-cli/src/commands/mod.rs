//! CLI command implementations.

pub mod account;
pub mod cache;
pub mod cards;
pub mod config;
pub mod export;
pub mod missing;

use anyhow::{Context, Result};
use cardgap_core::Card;
use cardgap_fetch::{CollectionService, FetchContext, FetchSettings};
use cardgap_store::AppConfig;
use tracing::debug;

use crate::output::{Envelope, JsonFormatter};
use crate::Cli;

/// Loads the config file, then applies environment and flag overrides.
pub async fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_from(&path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;

    config.apply_env();
    if let Some(locale) = &cli.locale {
        config.locale.clone_from(locale);
    }
    if let Some(target) = cli.target {
        config.target_count = target;
    }

    debug!(locale = %config.locale, backend = %config.backend, "Effective config");
    Ok(config)
}

/// Builds the collection service for a config.
pub async fn open_service(config: &AppConfig) -> Result<CollectionService> {
    let store = config.open_store().await?;
    let ctx = FetchContext::new(FetchSettings::from_config(config), store)?;
    Ok(CollectionService::new(ctx))
}

/// Fetches the enriched cards, online or from checkpoints.
pub async fn load_cards(service: &CollectionService, offline: bool) -> Result<Vec<Card>> {
    let cards = if offline {
        service.cards_offline(None).await?
    } else {
        service.cards(None).await?
    };
    Ok(cards)
}

/// Prints a success envelope.
pub fn print_envelope(envelope: &Envelope, cli: &Cli) -> Result<()> {
    println!("{}", JsonFormatter::new(cli.pretty).format(envelope)?);
    Ok(())
}
