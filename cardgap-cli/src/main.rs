// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! cardgap CLI - find the cards missing from an Altered TCG collection.
//!
//! # Examples
//!
//! ```bash
//! # Every card, enriched with ownership and price
//! cardgap cards
//!
//! # Missing cards and statistics
//! cardgap missing --target 3
//!
//! # Export missing cards as CSV
//! cardgap export --format csv --output missing_cards.csv
//!
//! # Analyze from checkpoints without touching the network
//! cardgap missing --offline
//!
//! # Drop one checkpoint
//! cardgap clear-cache --endpoint /cards --locale fr-fr
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{account, cache, cards, config, export, missing};
use output::{Envelope, JsonFormatter};

// ============================================================================
// CLI Definition
// ============================================================================

/// cardgap CLI - missing-card analysis for Altered TCG.
#[derive(Parser)]
#[command(name = "cardgap")]
#[command(about = "Fetch an Altered TCG collection and list missing cards")]
#[command(long_about = r#"
cardgap fetches the full card list and your collection statistics from the
Altered API, keeps resumable checkpoints on disk, and reports which cards
you are missing to reach a playset.

Every command prints a JSON envelope on stdout:
  {"success": true, "data": ...}
  {"success": false, "error": "..."}

Environment:
  ALTERED_API_URL      API base URL
  ALTERED_AUTH_TOKEN   Bearer token
  CARDGAP_CACHE_DIR    Checkpoint directory
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Locale for API requests (overrides config).
    #[arg(long, short, global = true)]
    pub locale: Option<String>,

    /// Path to the config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Copies of each card to aim for (overrides config).
    #[arg(long, short, global = true)]
    pub target: Option<u32>,

    /// Pretty-print JSON envelopes.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode (no logging).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Every card, enriched with ownership and lowest price.
    Cards(cards::CardsArgs),

    /// Missing cards and aggregate statistics.
    #[command(visible_alias = "m")]
    Missing(missing::MissingArgs),

    /// Export missing cards as JSON, CSV, or text.
    #[command(visible_alias = "e")]
    Export(export::ExportArgs),

    /// Filter metadata (rarities, types, factions).
    Filters,

    /// Current user.
    Me,

    /// One raw page of cards, for inspecting the API response.
    Page(account::PageArgs),

    /// Delete fetch checkpoints.
    ClearCache(cache::ClearCacheArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("cardgap=debug,info")
    } else {
        EnvFilter::new("cardgap=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Cards(args) => cards::run(args, &cli).await,
        Commands::Missing(args) => missing::run(args, &cli).await,
        Commands::Export(args) => export::run(args, &cli).await,
        Commands::Filters => account::run_filters(&cli).await,
        Commands::Me => account::run_me(&cli).await,
        Commands::Page(args) => account::run_page(args, &cli).await,
        Commands::ClearCache(args) => cache::run(args, &cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        let envelope = Envelope::failure(&e);
        println!("{}", JsonFormatter::new(cli.pretty).format(&envelope)?);
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
