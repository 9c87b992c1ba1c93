//! OHLCV candle types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One time bucket of open, high, low, close and traded volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Opening price
    pub open: f64,
    /// Highest price
    pub high: f64,
    /// Lowest price
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Traded volume
    pub volume: u64,
}

impl Candle {
    /// Create a new candle.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: u64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// The four OHLC prices in order.
    #[inline]
    pub fn prices(&self) -> [f64; 4] {
        [self.open, self.high, self.low, self.close]
    }

    /// Get the timestamp as a DateTime.
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }
}

impl Default for Candle {
    fn default() -> Self {
        Self {
            timestamp: 0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            close: 0.0,
            volume: 0,
        }
    }
}

/// Per-candle indicator values, index-aligned with the source candles.
///
/// `None` marks warm-up positions or zero cumulative volume.
pub type IndicatorSeries = Vec<Option<f64>>;

/// A candle together with the indicator value computed at its index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedCandle {
    #[serde(flatten)]
    pub candle: Candle,
    /// Indicator value, absent during warm-up
    pub indicator: Option<f64>,
}

impl AnnotatedCandle {
    /// Pair a candle with its indicator value.
    pub fn new(candle: Candle, indicator: Option<f64>) -> Self {
        Self { candle, indicator }
    }
}

/// Zip candles with an index-aligned indicator series.
///
/// Panics in debug builds if the lengths differ.
pub fn annotate(candles: &[Candle], values: IndicatorSeries) -> Vec<AnnotatedCandle> {
    debug_assert_eq!(candles.len(), values.len());
    candles
        .iter()
        .zip(values)
        .map(|(c, v)| AnnotatedCandle::new(*c, v))
        .collect()
}

/// Keep only the trailing `n` elements of a slice.
pub fn trailing<T: Clone>(items: &[T], n: usize) -> Vec<T> {
    let start = items.len().saturating_sub(n);
    items[start..].to_vec()
}
