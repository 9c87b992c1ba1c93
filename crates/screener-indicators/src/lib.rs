//! Indicator series for the breakout screener.
//!
//! Each indicator produces one optional value per input candle:
//! - Moving averages of closes (SMA, EMA)
//! - Cumulative volume-weighted close (VWAP)
//! - The close itself
//!
//! [`IndicatorEngine`] picks the indicator for a scan and attaches its
//! values to the candles.

pub mod engine;
pub mod moving_average;
pub mod volume;

pub use engine::{ClosePrice, IndicatorEngine};
pub use moving_average::{Ema, Sma};
pub use volume::Vwap;
