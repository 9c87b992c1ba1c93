//! CLI definitions.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "screener")]
#[command(author, version, about = "Three-candle indicator breakout screener")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "SCREENER_CONFIG")]
    pub config: PathBuf,

    /// Log level (defaults to the configured level)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a watchlist for the breakout pattern
    Scan(ScanArgs),
    /// Show indicator-annotated candles for one symbol
    Candles(CandlesArgs),
    /// Inspect recorded scan runs
    History(HistoryArgs),
    /// Validate configuration
    ValidateConfig,
    /// Write the default configuration file
    InitConfig(InitConfigArgs),
}

/// Parameters shared by `scan` and `candles`; unset values come from config.
#[derive(clap::Args)]
pub struct MarketArgs {
    /// Look-back range (today, 1h, 2h, 4h, 2d)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Candle timeframe (1m, 3m, 5m, 10m, 15m, 30m, 1h, 1d)
    #[arg(short, long)]
    pub timeframe: Option<String>,

    /// Indicator (VWAP, SMA, EMA, CLOSE)
    #[arg(short, long)]
    pub indicator: Option<String>,

    /// Indicator window for SMA/EMA, clamped to 2..=200
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Read candles from <SYMBOL>.csv files in this directory instead of the broker
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    pub output: String,
}

#[derive(clap::Args)]
pub struct ScanArgs {
    /// Symbols to scan, comma-separated, as SYMBOL or EXCHANGE:SYMBOL
    #[arg(short = 'S', long, value_delimiter = ',')]
    pub symbols: Vec<String>,

    /// Side of the indicator the second candle must sit on (ABOVE, BELOW)
    #[arg(long)]
    pub side: Option<String>,

    /// Price compared against the touch candle's high (CLOSE, HIGH)
    #[arg(long)]
    pub breakout_mode: Option<String>,

    /// Skip live price confirmation
    #[arg(long)]
    pub no_live: bool,

    /// Save the full run as JSON
    #[arg(long)]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub market: MarketArgs,
}

#[derive(clap::Args)]
pub struct CandlesArgs {
    /// Symbol as SYMBOL or EXCHANGE:SYMBOL
    #[arg(short = 'S', long)]
    pub symbol: String,

    /// Number of most recent candles shown in text output
    #[arg(long, default_value = "20")]
    pub limit: usize,

    #[command(flatten)]
    pub market: MarketArgs,
}

#[derive(clap::Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Subcommand)]
pub enum HistoryCommand {
    /// List recorded runs, latest first
    List {
        /// Show at most this many runs
        #[arg(long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        output: String,
    },
    /// Show one recorded run
    Show {
        /// Run id
        id: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        output: String,
    },
}

#[derive(clap::Args)]
pub struct InitConfigArgs {
    /// Destination file
    #[arg(default_value = "config/default.toml")]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}
