//! Indicator selection.

use crate::error::IndicatorError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest accepted indicator window.
pub const MIN_WINDOW: usize = 2;
/// Largest accepted indicator window.
pub const MAX_WINDOW: usize = 200;
/// Window used when none is given.
pub const DEFAULT_WINDOW: usize = 20;

/// Clamp a requested window into `[MIN_WINDOW, MAX_WINDOW]`.
pub fn clamp_window(window: usize) -> usize {
    window.clamp(MIN_WINDOW, MAX_WINDOW)
}

/// Indicator used as the comparison level for the pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    /// Cumulative volume-weighted close
    #[default]
    Vwap,
    /// Simple moving average of closes
    Sma,
    /// Exponential moving average of closes
    Ema,
    /// The close itself
    Close,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Close => "CLOSE",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for IndicatorKind {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "VWAP" => Ok(IndicatorKind::Vwap),
            "SMA" => Ok(IndicatorKind::Sma),
            "EMA" => Ok(IndicatorKind::Ema),
            "CLOSE" => Ok(IndicatorKind::Close),
            other => Err(IndicatorError::Unsupported(other.to_string())),
        }
    }
}
