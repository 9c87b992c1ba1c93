//! Pattern scanner.

use serde::{Deserialize, Serialize};
use tracing::debug;

use screener_core::types::{AnnotatedCandle, BreakoutMode, PatternHit, Side};

use crate::conditions::{is_all_one_side, touched_indicator};

/// Scanner settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Required side of the candle following the touch
    pub side: Side,
    /// Price of later candles compared against the touch high
    pub breakout_mode: BreakoutMode,
}

impl ScannerConfig {
    pub fn new(side: Side, breakout_mode: BreakoutMode) -> Self {
        Self { side, breakout_mode }
    }
}

/// Finds the first touch / one-sided / breakout triple in a series.
///
/// For each position `i` in `1..len-1` the earlier candle `i - 1` is the
/// touch candle and candle `i` is the one-sided candle. The first later
/// candle clearing the touch high completes the pattern and ends the scan.
#[derive(Debug, Clone, Default)]
pub struct PatternScanner {
    config: ScannerConfig,
}

impl PatternScanner {
    /// Create a new scanner.
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    /// Scanner settings.
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan the series, returning at most one hit.
    pub fn scan(&self, series: &[AnnotatedCandle]) -> Option<PatternHit> {
        let n = series.len();
        if n < 3 {
            return None;
        }

        for i in 1..n - 1 {
            let touch = &series[i - 1];
            let side = &series[i];

            let (Some(touch_level), Some(side_level)) = (touch.indicator, side.indicator) else {
                continue;
            };

            if !touched_indicator(&touch.candle, touch_level) {
                continue;
            }
            if !is_all_one_side(&side.candle, side_level, self.config.side) {
                continue;
            }

            let reference_high = touch.candle.high;
            let breakout = series[i + 1..]
                .iter()
                .position(|c| self.config.breakout_mode.price(&c.candle) > reference_high);

            if let Some(offset) = breakout {
                let hit = PatternHit {
                    touch_index: i - 1,
                    side_index: i,
                    breakout_index: i + 1 + offset,
                    reference_high,
                };
                debug!(
                    touch = hit.touch_index,
                    side = hit.side_index,
                    breakout = hit.breakout_index,
                    reference_high,
                    "Pattern found"
                );
                return Some(hit);
            }
        }

        None
    }
}
