//! Seeded stand-in candles.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use screener_core::types::{Candle, Timeframe};

const DEFAULT_SEED: u64 = 42;

/// Random-walk price path, one candle per interval.
///
/// Used when a real provider is unavailable so callers still get a
/// well-formed series. Closes move by a normal step from the open, wicks
/// extend by the absolute value of a wider normal draw, and each candle
/// opens at the previous close. The same seed always yields the same
/// series.
#[derive(Debug, Clone)]
pub struct SyntheticSeries {
    start_price: f64,
    count: usize,
    seed: u64,
}

impl Default for SyntheticSeries {
    fn default() -> Self {
        Self {
            start_price: 100.0,
            count: 600,
            seed: DEFAULT_SEED,
        }
    }
}

impl SyntheticSeries {
    pub fn new(start_price: f64, count: usize) -> Self {
        Self {
            start_price,
            count,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generate candles ending at the interval containing `end`.
    pub fn generate(&self, end: DateTime<Utc>, timeframe: Timeframe) -> Vec<Candle> {
        let step = timeframe.as_millis() as i64;
        let last = end.timestamp_millis() - end.timestamp_millis().rem_euclid(step);
        let first = last - step * self.count.saturating_sub(1) as i64;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let body = Normal::new(0.0, 0.2).expect("positive standard deviation");
        let wick = Normal::<f64>::new(0.0, 0.3).expect("positive standard deviation");

        let mut open = self.start_price;
        let mut candles = Vec::with_capacity(self.count);
        for i in 0..self.count {
            let close = open + body.sample(&mut rng);
            let high = open.max(close) + wick.sample(&mut rng).abs();
            let low = open.min(close) - wick.sample(&mut rng).abs();
            let volume = rng.gen_range(100..=1000);

            candles.push(Candle::new(first + step * i as i64, open, high, low, close, volume));
            open = close;
        }
        candles
    }
}
