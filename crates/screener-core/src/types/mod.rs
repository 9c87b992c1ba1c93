//! Core data types for the screener.

mod candle;
mod history;
mod indicator;
mod instrument;
mod range;
mod scan;
mod timeframe;

pub use candle::{annotate, trailing, AnnotatedCandle, Candle, IndicatorSeries};
pub use history::{HistoryEntry, HISTORY_TRAILING_CANDLES};
pub use indicator::{clamp_window, IndicatorKind, DEFAULT_WINDOW, MAX_WINDOW, MIN_WINDOW};
pub use instrument::{Exchange, Instrument};
pub use range::{market_offset, RangePreset, TimeRange};
pub use scan::{
    BreakoutMode, PatternHit, ScanFailure, ScanParams, ScanResult, ScanRun, Side,
    INSUFFICIENT_DATA_REASON, MAX_WATCHLIST,
};
pub use timeframe::Timeframe;
