//! Screener engine: runs the three-candle breakout scan over a watchlist.

mod compute;
mod orchestrator;
mod retry;

pub use compute::{CandleReport, CandleSource, ComputeRequest};
pub use orchestrator::{OrchestratorSettings, ScreenerOrchestrator};
pub use retry::RetryPolicy;
