//! Scan parameters, pattern hits and per-symbol results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{AnnotatedCandle, IndicatorKind, Instrument, RangePreset, Timeframe, DEFAULT_WINDOW};
use crate::error::{ErrorKind, ProviderError, ScreenerError};

/// Reason recorded when a provider returns too few candles.
pub const INSUFFICIENT_DATA_REASON: &str = "insufficient data";

/// Hard cap on symbols scanned per run.
pub const MAX_WATCHLIST: usize = 10;

/// Where the one-sided candle must sit relative to its indicator value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// All of open, high, low and close strictly above the indicator
    Above,
    /// All of open, high, low and close strictly below the indicator
    #[default]
    Below,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Above => write!(f, "ABOVE"),
            Side::Below => write!(f, "BELOW"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ABOVE" => Ok(Side::Above),
            "BELOW" => Ok(Side::Below),
            _ => Err(format!("Invalid side: {}", s)),
        }
    }
}

/// Which price of a later candle must exceed the reference level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BreakoutMode {
    #[default]
    Close,
    High,
}

impl BreakoutMode {
    /// The price of `candle` this mode compares.
    #[inline]
    pub fn price(&self, candle: &super::Candle) -> f64 {
        match self {
            BreakoutMode::Close => candle.close,
            BreakoutMode::High => candle.high,
        }
    }
}

impl fmt::Display for BreakoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakoutMode::Close => write!(f, "CLOSE"),
            BreakoutMode::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for BreakoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CLOSE" => Ok(BreakoutMode::Close),
            "HIGH" => Ok(BreakoutMode::High),
            _ => Err(format!("Invalid breakout mode: {}", s)),
        }
    }
}

/// A detected three-candle pattern.
///
/// `touch_index < side_index < breakout_index` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternHit {
    /// Earlier candle whose range contains or whose body crosses the indicator
    pub touch_index: usize,
    /// Candle immediately after the touch, entirely on one side of the indicator
    pub side_index: usize,
    /// First later candle exceeding the reference level
    pub breakout_index: usize,
    /// High of the touch candle
    pub reference_high: f64,
}

/// Parameters of one batch scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanParams {
    pub preset: RangePreset,
    pub timeframe: Timeframe,
    pub indicator: IndicatorKind,
    pub window: usize,
    pub side: Side,
    pub breakout_mode: BreakoutMode,
    pub confirm_with_live: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            preset: RangePreset::default(),
            timeframe: Timeframe::default(),
            indicator: IndicatorKind::default(),
            window: DEFAULT_WINDOW,
            side: Side::default(),
            breakout_mode: BreakoutMode::default(),
            confirm_with_live: true,
        }
    }
}

/// Structured record of a per-symbol failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    pub kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl From<&ProviderError> for ScanFailure {
    fn from(err: &ProviderError) -> Self {
        Self {
            kind: err.kind(),
            code: err.code().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl From<&ScreenerError> for ScanFailure {
    fn from(err: &ScreenerError) -> Self {
        match err {
            ScreenerError::Provider(e) => e.into(),
            other => Self {
                kind: other.kind().unwrap_or(ErrorKind::Provider),
                code: None,
                message: other.to_string(),
            },
        }
    }
}

/// Outcome of scanning one watchlist symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(flatten)]
    pub instrument: Instrument,
    /// Provider identifier (symbol token), once resolved
    #[serde(default)]
    pub identifier: Option<String>,
    pub matched: bool,
    #[serde(default)]
    pub hit: Option<PatternHit>,
    #[serde(default)]
    pub live_quote: Option<f64>,
    #[serde(default)]
    pub live_breakout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ScanFailure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_candle: Option<AnnotatedCandle>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candles: Vec<AnnotatedCandle>,
}

impl ScanResult {
    fn empty(instrument: Instrument, identifier: Option<String>) -> Self {
        Self {
            instrument,
            identifier,
            matched: false,
            hit: None,
            live_quote: None,
            live_breakout: None,
            reason: None,
            error: None,
            last_candle: None,
            candles: Vec::new(),
        }
    }

    /// The pattern was not found.
    pub fn no_match(instrument: Instrument, identifier: Option<String>) -> Self {
        Self::empty(instrument, identifier)
    }

    /// The pattern was found; keeps the annotated series for display and history.
    pub fn matched(
        instrument: Instrument,
        identifier: Option<String>,
        hit: PatternHit,
        candles: Vec<AnnotatedCandle>,
    ) -> Self {
        Self {
            matched: true,
            hit: Some(hit),
            last_candle: candles.last().copied(),
            candles,
            ..Self::empty(instrument, identifier)
        }
    }

    /// Too few candles to evaluate.
    pub fn insufficient_data(
        instrument: Instrument,
        identifier: Option<String>,
        required: usize,
        available: usize,
    ) -> Self {
        let err = ScreenerError::InsufficientData { required, available };
        Self {
            reason: Some(INSUFFICIENT_DATA_REASON.to_string()),
            error: Some((&err).into()),
            ..Self::empty(instrument, identifier)
        }
    }

    /// Processing failed for this symbol only.
    pub fn failed(instrument: Instrument, failure: ScanFailure) -> Self {
        Self {
            reason: Some(failure.message.clone()),
            error: Some(failure),
            ..Self::empty(instrument, None)
        }
    }

    /// Attach a live price and derive the live breakout flag.
    ///
    /// The flag stays absent when either the price or the reference level is unknown.
    pub fn attach_live_quote(&mut self, quote: Option<f64>) {
        let quote = quote.filter(|q| q.is_finite());
        self.live_quote = quote;
        self.live_breakout = match (quote, self.hit) {
            (Some(q), Some(hit)) if hit.reference_high.is_finite() => Some(q > hit.reference_high),
            _ => None,
        };
    }

    /// Copy of this result carrying at most the trailing `n` candles.
    pub fn with_trailing_candles(&self, n: usize) -> Self {
        Self {
            candles: super::trailing(&self.candles, n),
            ..self.clone()
        }
    }
}

/// Full output of one orchestrator pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRun {
    pub params: ScanParams,
    pub started_at: DateTime<Utc>,
    /// One entry per processed symbol, in watchlist order
    pub results: Vec<ScanResult>,
}

impl ScanRun {
    /// Results where the pattern was found.
    pub fn matched(&self) -> impl Iterator<Item = &ScanResult> {
        self.results.iter().filter(|r| r.matched)
    }

    /// Number of matched symbols.
    pub fn match_count(&self) -> usize {
        self.matched().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;

    fn hit(reference_high: f64) -> PatternHit {
        PatternHit {
            touch_index: 1,
            side_index: 2,
            breakout_index: 4,
            reference_high,
        }
    }

    #[test]
    fn test_attach_live_quote() {
        let mut result = ScanResult::matched(Instrument::nse("SBIN-EQ"), None, hit(100.0), vec![]);

        result.attach_live_quote(Some(101.0));
        assert_eq!(result.live_breakout, Some(true));

        result.attach_live_quote(Some(99.5));
        assert_eq!(result.live_breakout, Some(false));

        result.attach_live_quote(None);
        assert_eq!(result.live_quote, None);
        assert_eq!(result.live_breakout, None);

        result.attach_live_quote(Some(f64::NAN));
        assert_eq!(result.live_breakout, None);
    }

    #[test]
    fn test_live_breakout_needs_a_hit() {
        let mut result = ScanResult::no_match(Instrument::nse("SBIN-EQ"), Some("3045".into()));
        result.attach_live_quote(Some(500.0));

        assert_eq!(result.live_quote, Some(500.0));
        assert_eq!(result.live_breakout, None);
    }

    #[test]
    fn test_insufficient_data_result() {
        let result = ScanResult::insufficient_data(Instrument::nse("ITC-EQ"), None, 10, 4);

        assert!(!result.matched);
        assert_eq!(result.reason.as_deref(), Some(INSUFFICIENT_DATA_REASON));
        assert_eq!(result.error.unwrap().kind, ErrorKind::InsufficientData);
    }

    #[test]
    fn test_failed_result_keeps_provider_code() {
        let err = ProviderError::Throttled {
            code: "AB1004".into(),
            message: "Access denied because of exceeding access rate".into(),
        };
        let result = ScanResult::failed(Instrument::nse("TCS-EQ"), (&err).into());

        let failure = result.error.unwrap();
        assert_eq!(failure.kind, ErrorKind::Throttled);
        assert_eq!(failure.code.as_deref(), Some("AB1004"));
    }

    #[test]
    fn test_trailing_candles() {
        let candles: Vec<AnnotatedCandle> = (0..5)
            .map(|i| AnnotatedCandle::new(Candle::new(i, 1.0, 1.0, 1.0, 1.0, 1), Some(1.0)))
            .collect();
        let result = ScanResult::matched(Instrument::nse("A"), None, hit(1.0), candles);

        let trimmed = result.with_trailing_candles(2);
        assert_eq!(trimmed.candles.len(), 2);
        assert_eq!(trimmed.candles[0].candle.timestamp, 3);
        assert_eq!(trimmed.last_candle, result.last_candle);
    }

    #[test]
    fn test_params_serde() {
        let json = serde_json::to_value(ScanParams::default()).unwrap();
        assert_eq!(json["preset"], "today");
        assert_eq!(json["timeframe"], "5m");
        assert_eq!(json["indicator"], "VWAP");
        assert_eq!(json["side"], "BELOW");
        assert_eq!(json["breakout_mode"], "CLOSE");
    }

    #[test]
    fn test_breakout_price() {
        let candle = Candle::new(0, 10.0, 12.0, 9.0, 11.0, 1);
        assert_eq!(BreakoutMode::Close.price(&candle), 11.0);
        assert_eq!(BreakoutMode::High.price(&candle), 12.0);
    }
}
