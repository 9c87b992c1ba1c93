//! Scan command implementation.

use anyhow::{Context, Result};
use tracing::{info, warn};

use screener_config::AppConfig;
use screener_core::types::{Instrument, ScanParams};
use screener_monitor::{scan_summary, to_json, OutputFormat};

use super::{build_orchestrator, parse_or};
use crate::cli::ScanArgs;

fn scan_params(args: &ScanArgs, config: &AppConfig) -> Result<ScanParams> {
    let defaults = config.screener.scan_params();
    let market = &args.market;

    Ok(ScanParams {
        preset: parse_or(market.preset.as_deref(), defaults.preset, "range preset")?,
        timeframe: parse_or(market.timeframe.as_deref(), defaults.timeframe, "timeframe")?,
        indicator: parse_or(market.indicator.as_deref(), defaults.indicator, "indicator")?,
        window: market.window.unwrap_or(defaults.window),
        side: parse_or(args.side.as_deref(), defaults.side, "side")?,
        breakout_mode: parse_or(args.breakout_mode.as_deref(), defaults.breakout_mode, "breakout mode")?,
        confirm_with_live: defaults.confirm_with_live && !args.no_live,
    })
}

fn watchlist(args: &ScanArgs, config: &AppConfig) -> Result<Vec<Instrument>> {
    if args.symbols.iter().all(|s| s.trim().is_empty()) {
        let (list, invalid) = config.screener.parsed_watchlist();
        for e in invalid {
            warn!(error = %e, "Skipping configured watchlist entry");
        }
        return Ok(list);
    }

    args.symbols
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Instrument>().map_err(anyhow::Error::msg))
        .collect()
}

pub async fn run(args: ScanArgs, config: &AppConfig) -> Result<()> {
    let output: OutputFormat = args.market.output.parse().map_err(anyhow::Error::msg)?;
    let params = scan_params(&args, config)?;
    let watchlist = watchlist(&args, config)?;

    let orchestrator = build_orchestrator(config, args.market.data.as_deref())?;
    let run = orchestrator.run(&watchlist, &params).await.context("Scan failed")?;

    match output {
        OutputFormat::Json => println!("{}", to_json(&run)?),
        OutputFormat::Text => println!("{}", scan_summary(&run)),
    }

    if let Some(path) = &args.save {
        std::fs::write(path, to_json(&run)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Results saved to {:?}", path);
    }

    Ok(())
}
