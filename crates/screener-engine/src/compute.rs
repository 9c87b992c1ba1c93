//! Single-symbol candle and indicator request.

use serde::{Deserialize, Serialize};

use screener_core::error::ScreenerResult;
use screener_core::types::{
    clamp_window, AnnotatedCandle, IndicatorKind, Instrument, RangePreset, ScanFailure, Timeframe,
    DEFAULT_WINDOW,
};

/// Parameters of a single-symbol compute call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub preset: RangePreset,
    pub timeframe: Timeframe,
    pub indicator: IndicatorKind,
    pub window: usize,
}

impl Default for ComputeRequest {
    fn default() -> Self {
        Self {
            preset: RangePreset::default(),
            timeframe: Timeframe::default(),
            indicator: IndicatorKind::default(),
            window: DEFAULT_WINDOW,
        }
    }
}

impl ComputeRequest {
    /// Build a request from a free-form indicator name.
    ///
    /// Fails with an unsupported-indicator error for unknown names.
    pub fn new(preset: RangePreset, timeframe: Timeframe, indicator: &str, window: usize) -> ScreenerResult<Self> {
        Ok(Self {
            preset,
            timeframe,
            indicator: indicator.parse()?,
            window: clamp_window(window),
        })
    }
}

/// Where the candles of a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleSource {
    /// The configured market data provider
    Provider,
    /// Generated stand-in data after a provider failure
    Fallback,
}

/// Annotated candles for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleReport {
    pub source: CandleSource,
    #[serde(flatten)]
    pub instrument: Instrument,
    #[serde(default)]
    pub identifier: Option<String>,
    pub params: ComputeRequest,
    pub candles: Vec<AnnotatedCandle>,
    /// Provider failure that caused a fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ScanFailure>,
}
