//! Configuration structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use screener_core::types::{
    BreakoutMode, IndicatorKind, Instrument, RangePreset, ScanParams, Side, Timeframe, DEFAULT_WINDOW,
    MAX_WATCHLIST,
};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub angel: AngelSettings,
    #[serde(default)]
    pub screener: ScreenerSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "screener".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Daily-rotated log file, in addition to stderr
    pub file: Option<String>,
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

/// Angel One SmartAPI configuration.
///
/// Credentials themselves never live in the file, only the names of the
/// environment variables holding them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AngelSettings {
    pub api_key_env: String,
    pub client_code_env: String,
    pub mpin_env: String,
    pub totp_secret_env: String,
    pub base_url: String,
    pub scrip_master_url: String,
    pub session_ttl_secs: i64,
    pub timeout_secs: u64,
}

impl Default for AngelSettings {
    fn default() -> Self {
        Self {
            api_key_env: "ANGEL_API_KEY".to_string(),
            client_code_env: "ANGEL_CLIENT_CODE".to_string(),
            mpin_env: "ANGEL_MPIN".to_string(),
            totp_secret_env: "ANGEL_TOTP_SECRET".to_string(),
            base_url: "https://apiconnect.angelbroking.com".to_string(),
            scrip_master_url:
                "https://margincalculator.angelbroking.com/OpenAPI_File/files/OpenAPIScripMaster.json"
                    .to_string(),
            session_ttl_secs: 600,
            timeout_secs: 30,
        }
    }
}

/// Scan defaults and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerSettings {
    pub preset: RangePreset,
    pub timeframe: Timeframe,
    pub indicator: IndicatorKind,
    pub window: usize,
    pub side: Side,
    pub breakout_mode: BreakoutMode,
    pub confirm_with_live: bool,
    pub max_watchlist: usize,
    pub min_candles: usize,
    pub throttle_ms: u64,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    /// Used when no symbols are given on the command line
    pub watchlist: Vec<String>,
}

impl ScreenerSettings {
    /// Scan parameters built from the configured defaults.
    pub fn scan_params(&self) -> ScanParams {
        ScanParams {
            preset: self.preset,
            timeframe: self.timeframe,
            indicator: self.indicator,
            window: self.window,
            side: self.side,
            breakout_mode: self.breakout_mode,
            confirm_with_live: self.confirm_with_live,
        }
    }

    /// Symbols scanned per run: the configured maximum, never above
    /// [`MAX_WATCHLIST`].
    pub fn watchlist_limit(&self) -> usize {
        self.max_watchlist.min(MAX_WATCHLIST)
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// The configured watchlist, parsed. Entries that fail to parse are
    /// returned as messages alongside.
    pub fn parsed_watchlist(&self) -> (Vec<Instrument>, Vec<String>) {
        let mut parsed = Vec::new();
        let mut invalid = Vec::new();
        for entry in self.watchlist.iter().filter(|s| !s.trim().is_empty()) {
            match entry.parse::<Instrument>() {
                Ok(inst) => parsed.push(inst),
                Err(e) => invalid.push(e),
            }
        }
        (parsed, invalid)
    }
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            preset: RangePreset::Today,
            timeframe: Timeframe::Minute5,
            indicator: IndicatorKind::Vwap,
            window: DEFAULT_WINDOW,
            side: Side::Below,
            breakout_mode: BreakoutMode::Close,
            confirm_with_live: true,
            max_watchlist: MAX_WATCHLIST,
            min_candles: 10,
            throttle_ms: 250,
            retry_attempts: 3,
            retry_base_delay_ms: 600,
            watchlist: [
                "RELIANCE-EQ",
                "TCS-EQ",
                "HDFCBANK-EQ",
                "INFY-EQ",
                "ICICIBANK-EQ",
                "SBIN-EQ",
                "ITC-EQ",
                "LT-EQ",
                "AXISBANK-EQ",
                "KOTAKBANK-EQ",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Scan history persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub path: String,
    pub max_entries: usize,
    pub trailing_candles: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            path: "data/results_history.json".to_string(),
            max_entries: 200,
            trailing_candles: 300,
        }
    }
}
