//! Moving average indicators.

use screener_core::traits::Indicator;
use screener_core::types::{Candle, IndicatorSeries};

/// Simple Moving Average (SMA) of closes.
///
/// The first `period - 1` positions are undefined. Every later value is the
/// plain mean of the `period` most recent closes, summed afresh for each
/// window so no rounding error accumulates across the series.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        let mut result = vec![None; candles.len()];
        if candles.len() < self.period {
            return result;
        }

        let period_f64 = self.period as f64;
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        for (offset, window) in closes.windows(self.period).enumerate() {
            let sum: f64 = window.iter().sum();
            result[offset + self.period - 1] = Some(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA) of closes.
///
/// Seeded with the first close and defined at every position:
/// `ema[i] = a * close[i] + (1 - a) * ema[i - 1]` with `a = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }
}

impl Indicator for Ema {
    fn calculate(&self, candles: &[Candle]) -> IndicatorSeries {
        let one_minus_mult = 1.0 - self.multiplier;
        let mut ema: Option<f64> = None;

        candles
            .iter()
            .map(|c| {
                let next = match ema {
                    None => c.close,
                    Some(prev) => c.close * self.multiplier + prev * one_minus_mult,
                };
                ema = Some(next);
                ema
            })
            .collect()
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }

    fn warmup(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 60_000, c, c + 1.0, c - 1.0, c, 100))
            .collect()
    }

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = sma.calculate(&candles);

        assert_eq!(result.len(), 5);
        assert!(result[0].is_none());
        assert!(result[1].is_none());
        assert!((result[2].unwrap() - 2.0).abs() < 1e-10); // (1+2+3)/3
        assert!((result[3].unwrap() - 3.0).abs() < 1e-10); // (2+3+4)/3
        assert!((result[4].unwrap() - 4.0).abs() < 1e-10); // (3+4+5)/3
        assert_eq!(sma.warmup(), 2);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(5);
        let candles = candles_from_closes(&[1.0, 2.0, 3.0]);
        let result = sma.calculate(&candles);

        assert_eq!(result, vec![None, None, None]);
    }

    #[test]
    fn test_ema() {
        let ema = Ema::new(3);
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = ema.calculate(&candles);

        // mult = 2/(3+1) = 0.5
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], Some(1.0));
        assert!((result[1].unwrap() - 1.5).abs() < 1e-10); // 2*0.5 + 1*0.5
        assert!((result[2].unwrap() - 2.25).abs() < 1e-10); // 3*0.5 + 1.5*0.5
    }

    #[test]
    fn test_ema_second_value_formula() {
        let ema = Ema::new(20);
        let alpha = 2.0 / 21.0;
        let candles = candles_from_closes(&[100.0, 110.0]);
        let result = ema.calculate(&candles);

        assert_eq!(result[0], Some(100.0));
        let expected = alpha * 110.0 + (1.0 - alpha) * 100.0;
        assert!((result[1].unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_ema_empty() {
        assert!(Ema::new(5).calculate(&[]).is_empty());
    }
}
