//! Config command - manage configuration.

use anyhow::Result;
use cardgap_store::{default_cache_dir, default_config_dir, AppConfig};
use clap::{Args, Subcommand};
use serde_json::json;
use tracing::info;

use super::{load_config, print_envelope};
use crate::output::Envelope;
use crate::Cli;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write the default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli).await,
        ConfigAction::Init { force } => init_config(*force, cli).await,
        ConfigAction::Reset => reset_config(cli).await,
    }
}

fn config_path(cli: &Cli) -> std::path::PathBuf {
    cli.config.clone().unwrap_or_else(AppConfig::default_path)
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let mut data = serde_json::to_value(&config)?;
    data["authToken"] = json!(config.auth_token.is_some());
    data["cacheDir"] = json!(config.cache_dir().display().to_string());
    print_envelope(&Envelope::ok(data)?, cli)
}

async fn show_paths(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let paths = json!({
        "configDir": default_config_dir().display().to_string(),
        "configFile": config_path(cli).display().to_string(),
        "defaultCacheDir": default_cache_dir().display().to_string(),
        "cacheDir": config.cache_dir().display().to_string(),
    });
    print_envelope(&Envelope::ok(paths)?, cli)
}

async fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = config_path(cli);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    AppConfig::default().save_to(&path).await?;
    info!(path = %path.display(), "Config initialized");
    print_envelope(
        &Envelope::message(format!("Config written to {}", path.display())),
        cli,
    )
}

async fn reset_config(cli: &Cli) -> Result<()> {
    let path = config_path(cli);

    let message = if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Config reset");
        "Configuration reset to defaults".to_string()
    } else {
        "No configuration file to reset".to_string()
    };

    print_envelope(&Envelope::message(message), cli)
}
