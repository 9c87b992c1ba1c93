//! Volume-weighted indicators.

use screener_core::traits::Indicator;
use screener_core::types::{Candle, IndicatorSeries};

/// Cumulative volume-weighted average of closes from the first candle.
///
/// Uses the close rather than the typical price. A position is undefined
/// while cumulative volume is still zero.
#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        let mut cum_pv = 0.0;
        let mut cum_vol: u64 = 0;

        candles
            .iter()
            .map(|c| {
                cum_pv += c.close * c.volume as f64;
                cum_vol = cum_vol.saturating_add(c.volume);
                if cum_vol == 0 {
                    None
                } else {
                    Some(cum_pv / cum_vol as f64)
                }
            })
            .collect()
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "VWAP"
    }
}
