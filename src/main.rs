//! Breakout screener CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, LogLevel};
use screener_config::{load_config, AppConfig};
use screener_monitor::{setup_logging, WorkerGuard};
use std::path::Path;

/// Load configuration and start logging. CLI flags win over the file.
///
/// The guard flushes the log file on drop.
fn prepare(
    config_path: &Path,
    log_level: Option<LogLevel>,
    json_logs: bool,
) -> Result<(AppConfig, Option<WorkerGuard>)> {
    let config = load_config(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let level = log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let json = json_logs || config.logging.is_json();
    let guard = setup_logging(&level, json, config.logging.file.as_deref().map(Path::new))
        .context("Failed to open log file")?;

    Ok((config, guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let (log_level, json_logs) = (cli.log_level, cli.json_logs);

    // Execute command
    match cli.command {
        Commands::InitConfig(args) => cli::commands::init::run(args),
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
        Commands::Scan(args) => {
            let (config, _guard) = prepare(&cli.config, log_level, json_logs)?;
            cli::commands::scan::run(args, &config).await
        }
        Commands::Candles(args) => {
            let (config, _guard) = prepare(&cli.config, log_level, json_logs)?;
            cli::commands::candles::run(args, &config).await
        }
        Commands::History(args) => {
            let (config, _guard) = prepare(&cli.config, log_level, json_logs)?;
            cli::commands::history::run(args.command, &config).await
        }
    }
}
