//! CLI command implementations.

pub mod candles;
pub mod history;
pub mod init;
pub mod scan;
pub mod validate;

use anyhow::{anyhow, Result};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use screener_broker::{AngelConfig, AngelOneClient, CredentialVars, UnavailableBroker};
use screener_config::AppConfig;
use screener_core::traits::{CandleProvider, Clock, QuoteProvider, SessionProvider, SystemClock};
use screener_data::{CsvCandleProvider, HistoryStore, JsonFileBackend};
use screener_engine::{OrchestratorSettings, RetryPolicy, ScreenerOrchestrator};

type Providers = (
    Arc<dyn CandleProvider>,
    Arc<dyn QuoteProvider>,
    Arc<dyn SessionProvider>,
);

fn providers<P>(provider: Arc<P>) -> Providers
where
    P: CandleProvider + QuoteProvider + SessionProvider + 'static,
{
    (provider.clone(), provider.clone(), provider)
}

/// Parse an optional CLI override, falling back to the configured value.
pub(crate) fn parse_or<T>(value: Option<&str>, default: T, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(v) => v.parse().map_err(|e| anyhow!("Invalid {}: {}", what, e)),
        None => Ok(default),
    }
}

fn history_store(config: &AppConfig) -> HistoryStore {
    HistoryStore::new(
        JsonFileBackend::new(&config.history.path),
        config.history.max_entries,
    )
}

/// Orchestrator over the broker, or over CSV files when `data` is given.
///
/// Missing broker credentials are not an error here: the broker calls fail
/// with a configuration error instead, so history and fallback candles
/// stay usable.
pub(crate) fn build_orchestrator(config: &AppConfig, data: Option<&Path>) -> Result<ScreenerOrchestrator> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (candles, quotes, session) = match data {
        Some(dir) => {
            if !dir.is_dir() {
                anyhow::bail!(
                    "Data path '{}' is not a directory. Provide a directory containing <SYMBOL>.csv files (e.g. --data ./data)",
                    dir.display()
                );
            }
            info!(dir = %dir.display(), "Using CSV candle data");
            providers(Arc::new(CsvCandleProvider::new(dir)))
        }
        None => {
            let angel = &config.angel;
            let api = AngelConfig {
                base_url: angel.base_url.clone(),
                scrip_master_url: angel.scrip_master_url.clone(),
                session_ttl_secs: angel.session_ttl_secs,
                timeout_secs: angel.timeout_secs,
            };
            let vars = CredentialVars {
                api_key: angel.api_key_env.clone(),
                client_code: angel.client_code_env.clone(),
                mpin: angel.mpin_env.clone(),
                totp_secret: angel.totp_secret_env.clone(),
            };
            match AngelOneClient::from_env(api, &vars, Arc::clone(&clock)) {
                Ok(client) => {
                    info!(base_url = %angel.base_url, "Using Angel One market data");
                    providers(Arc::new(client))
                }
                Err(e) => {
                    warn!(error = %e, "Angel One client unavailable, set credentials in the environment or use --data");
                    providers(Arc::new(UnavailableBroker::new(e.to_string())))
                }
            }
        }
    };

    let screener = &config.screener;
    let settings = OrchestratorSettings {
        throttle: screener.throttle(),
        min_candles: screener.min_candles,
        max_watchlist: screener.watchlist_limit(),
        trailing_candles: config.history.trailing_candles,
        retry: RetryPolicy::new(screener.retry_attempts, screener.retry_base_delay()),
        fallback_on_error: true,
    };

    Ok(ScreenerOrchestrator::new(
        candles,
        quotes,
        session,
        Arc::new(history_store(config)),
        clock,
    )
    .with_settings(settings))
}
