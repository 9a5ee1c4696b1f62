//! One-shot API commands: filters, me, and raw page.

use anyhow::Result;
use cardgap_fetch::DEFAULT_RAW_PAGE_SIZE;
use clap::Args;

use super::{load_config, open_service, print_envelope};
use crate::output::Envelope;
use crate::Cli;

/// Arguments for the page command.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Page number, starting at 1.
    #[arg(long, short, default_value_t = 1)]
    pub page: u32,

    /// Items on the page.
    #[arg(long, default_value_t = DEFAULT_RAW_PAGE_SIZE)]
    pub items_per_page: u32,
}

/// Runs the filters command.
pub async fn run_filters(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;
    let filters = service.filter_data(None).await?;
    print_envelope(&Envelope::ok(&filters)?, cli)
}

/// Runs the me command.
pub async fn run_me(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;
    let user = service.user_info().await?;
    print_envelope(&Envelope::ok(&user)?, cli)
}

/// Runs the page command.
pub async fn run_page(args: &PageArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;
    let body = service
        .page(args.page, Some(args.items_per_page), None)
        .await?;
    print_envelope(&Envelope::ok(body)?, cli)
}
