//! Indicator trait definitions.

use crate::types::{Candle, IndicatorSeries};

/// Trait for per-candle indicators.
///
/// Implementations return one value per input candle, so the output is
/// always index-aligned with the input. Positions without a defined value
/// (warm-up, zero volume) are `None`.
pub trait Indicator: Send + Sync {
    /// Calculate indicator values for the given candles.
    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries;

    /// Number of candles that contribute to one value.
    fn period(&self) -> usize;

    /// Get the name of the indicator.
    fn name(&self) -> &str;

    /// Number of leading positions left undefined.
    fn warmup(&self) -> usize {
        self.period().saturating_sub(1)
    }
}
