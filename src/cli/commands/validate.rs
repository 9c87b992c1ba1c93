//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use screener_config::load_config;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    match load_config(config_path) {
        Ok(config) => {
            println!("Configuration is valid!");
            println!();
            println!("App: {}", config.app.name);
            println!("Environment: {}", config.app.environment);
            println!("Log level: {}", config.logging.level);
            println!("Defaults: {}", config.screener.scan_params().indicator);
            println!("Watchlist: {} symbols (max {})", config.screener.watchlist.len(), config.screener.watchlist_limit());
            println!("Throttle: {} ms, retries: {}", config.screener.throttle_ms, config.screener.retry_attempts);
            println!("History: {} (max {} runs)", config.history.path, config.history.max_entries);

            let (_, invalid) = config.screener.parsed_watchlist();
            for e in &invalid {
                println!("Warning: {}", e);
            }
            if config.screener.watchlist.len() > config.screener.watchlist_limit() {
                println!(
                    "Warning: only the first {} watchlist symbols are scanned",
                    config.screener.watchlist_limit()
                );
            }
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
