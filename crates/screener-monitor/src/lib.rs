//! Logging and report rendering.

mod logging;
mod report;

pub use logging::setup_logging;
pub use tracing_appender::non_blocking::WorkerGuard;
pub use report::{candles_table, history_detail, history_table, scan_summary, to_json, OutputFormat};
