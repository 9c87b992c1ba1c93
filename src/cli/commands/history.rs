//! History commands.

use anyhow::{Context, Result};

use screener_config::AppConfig;
use screener_monitor::{history_detail, history_table, to_json, OutputFormat};

use super::build_orchestrator;
use crate::cli::HistoryCommand;

pub async fn run(command: HistoryCommand, config: &AppConfig) -> Result<()> {
    let orchestrator = build_orchestrator(config, None)?;

    match command {
        HistoryCommand::List { limit, output } => {
            let output: OutputFormat = output.parse().map_err(anyhow::Error::msg)?;
            let mut entries = orchestrator.list_history().await.context("Failed to read history")?;
            if let Some(limit) = limit {
                entries.truncate(limit);
            }

            match output {
                OutputFormat::Json => println!("{}", to_json(&entries)?),
                OutputFormat::Text => println!("{}", history_table(&entries)),
            }
        }
        HistoryCommand::Show { id, output } => {
            let output: OutputFormat = output.parse().map_err(anyhow::Error::msg)?;
            let entry = orchestrator.get_history(&id).await?;

            match output {
                OutputFormat::Json => println!("{}", to_json(&entry)?),
                OutputFormat::Text => println!("{}", history_detail(&entry)),
            }
        }
    }

    Ok(())
}
