//! Single-symbol candles command.

use anyhow::{Context, Result};

use screener_config::AppConfig;
use screener_core::types::Instrument;
use screener_monitor::{candles_table, to_json, OutputFormat};

use super::{build_orchestrator, parse_or};
use crate::cli::CandlesArgs;

pub async fn run(args: CandlesArgs, config: &AppConfig) -> Result<()> {
    let market = &args.market;
    let output: OutputFormat = market.output.parse().map_err(anyhow::Error::msg)?;
    let instrument: Instrument = args.symbol.parse().map_err(anyhow::Error::msg)?;

    let defaults = &config.screener;
    let preset = parse_or(market.preset.as_deref(), defaults.preset, "range preset")?;
    let timeframe = parse_or(market.timeframe.as_deref(), defaults.timeframe, "timeframe")?;
    let indicator = market
        .indicator
        .clone()
        .unwrap_or_else(|| defaults.indicator.to_string());
    let window = market.window.unwrap_or(defaults.window);

    let orchestrator = build_orchestrator(config, market.data.as_deref())?;
    let report = orchestrator
        .compute_named(&instrument, preset, timeframe, &indicator, window)
        .await
        .with_context(|| format!("Failed to compute {} for {}", indicator, instrument))?;

    match output {
        OutputFormat::Json => println!("{}", to_json(&report)?),
        OutputFormat::Text => println!("{}", candles_table(&report, args.limit)),
    }

    Ok(())
}
