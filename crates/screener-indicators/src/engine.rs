//! Indicator selection and candle annotation.

use screener_core::error::IndicatorError;
use screener_core::traits::Indicator;
use screener_core::types::{annotate, clamp_window, AnnotatedCandle, Candle, IndicatorKind, IndicatorSeries};

use crate::moving_average::{Ema, Sma};
use crate::volume::Vwap;

/// The close price itself, used as a degenerate indicator.
#[derive(Debug, Clone, Default)]
pub struct ClosePrice;

impl Indicator for ClosePrice {
    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        candles.iter().map(|c| Some(c.close)).collect()
    }

    fn period(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "CLOSE"
    }
}

/// Computes one indicator series and attaches it to the candles.
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Build the indicator for `kind`, clamping `window` into the accepted range.
    pub fn indicator(kind: IndicatorKind, window: usize) -> Box<dyn Indicator> {
        let window = clamp_window(window);
        match kind {
            IndicatorKind::Vwap => Box::new(Vwap::new()),
            IndicatorKind::Sma => Box::new(Sma::new(window)),
            IndicatorKind::Ema => Box::new(Ema::new(window)),
            IndicatorKind::Close => Box::new(ClosePrice),
        }
    }

    /// Annotate every candle with its indicator value.
    ///
    /// The output has exactly one entry per input candle, in the same order.
    pub fn compute(candles: &[Candle], kind: IndicatorKind, window: usize) -> Vec<AnnotatedCandle> {
        let series = Self::indicator(kind, window).calculate(candles);
        annotate(candles, series)
    }

    /// Same as [`compute`](Self::compute), selecting the indicator by name.
    pub fn compute_by_name(
        candles: &[Candle],
        name: &str,
        window: usize,
    ) -> Result<Vec<AnnotatedCandle>, IndicatorError> {
        let kind: IndicatorKind = name.parse()?;
        Ok(Self::compute(candles, kind, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let c = 100.0 + (i as f64 * 0.7).sin() * 5.0;
                Candle::new(i as i64 * 60_000, c - 0.5, c + 1.0, c - 1.0, c, 100 + i as u64)
            })
            .collect()
    }

    #[test]
    fn test_output_length_matches_input() {
        let candles = sample_candles(37);
        for kind in [IndicatorKind::Vwap, IndicatorKind::Sma, IndicatorKind::Ema, IndicatorKind::Close] {
            let annotated = IndicatorEngine::compute(&candles, kind, 20);
            assert_eq!(annotated.len(), candles.len());
            for (a, c) in annotated.iter().zip(&candles) {
                assert_eq!(a.candle, *c);
            }
        }
    }

    #[test]
    fn test_sma_warmup_and_mean() {
        let candles = sample_candles(30);
        let annotated = IndicatorEngine::compute(&candles, IndicatorKind::Sma, 20);

        assert!(annotated[..19].iter().all(|a| a.indicator.is_none()));
        let mean: f64 = candles[..20].iter().map(|c| c.close).sum::<f64>() / 20.0;
        assert!((annotated[19].indicator.unwrap() - mean).abs() < 1e-10);
    }

    #[test]
    fn test_close_passthrough() {
        let candles = sample_candles(5);
        let annotated = IndicatorEngine::compute(&candles, IndicatorKind::Close, 20);

        for a in &annotated {
            assert_eq!(a.indicator, Some(a.candle.close));
        }
    }

    #[test]
    fn test_window_is_clamped() {
        let candles = sample_candles(4);

        // window 1 is raised to 2
        let annotated = IndicatorEngine::compute(&candles, IndicatorKind::Sma, 1);
        assert!(annotated[0].indicator.is_none());
        assert!(annotated[1].indicator.is_some());

        // window 500 is lowered to 200, so nothing is defined yet
        let annotated = IndicatorEngine::compute(&candles, IndicatorKind::Sma, 500);
        assert!(annotated.iter().all(|a| a.indicator.is_none()));
    }

    #[test]
    fn test_empty_input() {
        assert!(IndicatorEngine::compute(&[], IndicatorKind::Vwap, 20).is_empty());
    }

    #[test]
    fn test_unsupported_indicator() {
        let candles = sample_candles(5);
        let err = IndicatorEngine::compute_by_name(&candles, "RSI", 14).unwrap_err();
        assert_eq!(err, IndicatorError::Unsupported("RSI".to_string()));

        let ok = IndicatorEngine::compute_by_name(&candles, "ema", 3).unwrap();
        assert_eq!(ok.len(), 5);
    }
}
