//! Export command - render missing cards to a file or stdout.

use anyhow::{Context, Result};
use cardgap_core::MissingAnalyzer;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use super::{load_cards, load_config, open_service, print_envelope};
use crate::output::{export, Envelope, ExportFormat};
use crate::Cli;

/// Arguments for the export command.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output format: json, csv, or txt. Unknown values fall back to json.
    #[arg(long, short, default_value = "json")]
    pub format: String,

    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Use stored checkpoints only, no network.
    #[arg(long)]
    pub offline: bool,
}

/// Runs the export command.
///
/// The rendered document goes to stdout as-is. With `--output` it is
/// written to the file and a success envelope is printed instead.
pub async fn run(args: &ExportArgs, cli: &Cli) -> Result<()> {
    let format = ExportFormat::from_token(&args.format);
    let config = load_config(cli).await?;
    let service = open_service(&config).await?;
    let cards = load_cards(&service, args.offline).await?;

    let analyzer = MissingAnalyzer::new(config.target_count);
    let missing = analyzer.analyze(&cards);
    let content = export(&missing, format, analyzer.target())?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &content)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), format = %format, count = missing.len(), "Export written");

            let envelope = Envelope::ok(json!({
                "path": path.display().to_string(),
                "format": format.to_string(),
                "filename": format.default_filename(),
                "count": missing.len(),
            }))?;
            print_envelope(&envelope, cli)
        }
        None => {
            println!("{content}");
            Ok(())
        }
    }
}
