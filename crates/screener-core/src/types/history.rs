//! Persisted record of a scan run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ScanParams, ScanRun, ScanResult};

/// Number of trailing candles kept per stored result.
pub const HISTORY_TRAILING_CANDLES: usize = 300;

/// One stored scan run. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Millisecond timestamp rendered as a string; sorts with creation order
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub params: ScanParams,
    /// Matched results only, in watchlist order
    pub results: Vec<ScanResult>,
}

impl HistoryEntry {
    /// Build an entry from a finished run, keeping only matched results
    /// and trimming their candle series to the trailing `trailing` candles.
    pub fn from_run(run: &ScanRun, timestamp: DateTime<Utc>, trailing: usize) -> Self {
        Self {
            id: timestamp.timestamp_millis().to_string(),
            timestamp,
            params: run.params.clone(),
            results: run
                .matched()
                .map(|r| r.with_trailing_candles(trailing))
                .collect(),
        }
    }

    /// Numeric form of the id, if it is one.
    pub fn sequence(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnnotatedCandle, Candle, Instrument, PatternHit};
    use chrono::TimeZone;

    #[test]
    fn test_from_run_keeps_matched_only() {
        let candles: Vec<AnnotatedCandle> = (0..400)
            .map(|i| AnnotatedCandle::new(Candle::new(i, 1.0, 1.0, 1.0, 1.0, 1), Some(1.0)))
            .collect();
        let hit = PatternHit {
            touch_index: 0,
            side_index: 1,
            breakout_index: 2,
            reference_high: 1.0,
        };
        let run = ScanRun {
            params: ScanParams::default(),
            started_at: Utc::now(),
            results: vec![
                ScanResult::no_match(Instrument::nse("A"), None),
                ScanResult::matched(Instrument::nse("B"), Some("1".into()), hit, candles),
            ],
        };

        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let entry = HistoryEntry::from_run(&run, ts, HISTORY_TRAILING_CANDLES);

        assert_eq!(entry.id, ts.timestamp_millis().to_string());
        assert_eq!(entry.sequence(), Some(ts.timestamp_millis()));
        assert_eq!(entry.results.len(), 1);
        assert_eq!(entry.results[0].instrument.symbol, "B");
        assert_eq!(entry.results[0].candles.len(), 300);
        assert_eq!(entry.results[0].candles[0].candle.timestamp, 100);
    }
}
