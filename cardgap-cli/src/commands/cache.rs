//! Clear-cache command.

use anyhow::Result;
use clap::Args;
use tracing::info;

use super::{load_config, open_service, print_envelope};
use crate::output::Envelope;
use crate::Cli;

/// Arguments for the clear-cache command.
///
/// With both `--endpoint` and the global `--locale` only that checkpoint
/// is deleted; otherwise all of them are.
#[derive(Args, Debug, Default)]
pub struct ClearCacheArgs {
    /// Endpoint whose checkpoint to delete, e.g. `/cards`.
    #[arg(long)]
    pub endpoint: Option<String>,
}

/// Runs the clear-cache command.
pub async fn run(args: &ClearCacheArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;

    let endpoint = args.endpoint.as_deref();
    let locale = cli.locale.as_deref();
    service.clear_cache(endpoint, locale).await?;

    let message = match (endpoint, locale) {
        (Some(endpoint), Some(locale)) => format!("Cache cleared for {endpoint} ({locale})"),
        _ => "Cache cleared successfully".to_string(),
    };
    info!("{message}");

    print_envelope(&Envelope::message(message), cli)
}
