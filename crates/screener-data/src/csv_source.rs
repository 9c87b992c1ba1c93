//! Offline candle source backed by CSV files.
//!
//! Expects one `<SYMBOL>.csv` per instrument in a directory, with a header
//! row and `timestamp,open,high,low,close,volume` columns (common aliases
//! accepted). The same files answer quote requests with their last close.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use screener_core::error::ProviderError;
use screener_core::traits::{CandleBatch, CandleProvider, LatestPrice, QuoteProvider, QuoteRequest, SessionProvider};
use screener_core::types::{Candle, Instrument, Timeframe, TimeRange};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "time", alias = "Time", alias = "Timestamp")]
    timestamp: String,
    #[serde(alias = "Open")]
    open: f64,
    #[serde(alias = "High")]
    high: f64,
    #[serde(alias = "Low")]
    low: f64,
    #[serde(alias = "Close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", default)]
    volume: f64,
}

/// Candle, quote and session provider over a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvCandleProvider {
    dir: PathBuf,
    filter_range: bool,
}

impl CsvCandleProvider {
    /// Create a provider reading from `dir`.
    ///
    /// By default every row of a file is served regardless of the requested
    /// range, which replays recorded sessions.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filter_range: false,
        }
    }

    /// Only serve candles inside the requested range.
    pub fn with_range_filter(mut self, enabled: bool) -> Self {
        self.filter_range = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Load all candles for `instrument`, sorted by time.
    pub fn load(&self, instrument: &Instrument) -> Result<Vec<Candle>, ProviderError> {
        let path = self.file_for(&instrument.symbol);
        if !path.exists() {
            return Err(ProviderError::NotResolvable {
                exchange: instrument.exchange.to_string(),
                symbol: instrument.symbol.clone(),
            });
        }
        load_from_path(&path)
    }
}

fn load_from_path(path: &Path) -> Result<Vec<Candle>, ProviderError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ProviderError::upstream(format!("{}: {}", path.display(), e)))?;

    let mut candles = Vec::new();

    for result in reader.deserialize() {
        let record: CsvRecord =
            result.map_err(|e| ProviderError::upstream(format!("{}: {}", path.display(), e)))?;

        let timestamp = parse_timestamp(&record.timestamp)?;

        candles.push(Candle::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume.max(0.0).round() as u64,
        ));
    }

    candles.sort_by_key(|c| c.timestamp);

    Ok(candles)
}

/// Parse various timestamp formats into Unix milliseconds.
fn parse_timestamp(date_str: &str) -> Result<i64, ProviderError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    let formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
    for format in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y"] {
        if let Some(dt) = NaiveDate::parse_from_str(date_str, format)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    // Unix timestamp; assume milliseconds if > 10 digits
    if let Ok(ts) = date_str.parse::<i64>() {
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(ProviderError::upstream(format!("Could not parse date: {}", date_str)))
}

#[async_trait]
impl CandleProvider for CsvCandleProvider {
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        _timeframe: Timeframe,
        range: TimeRange,
    ) -> Result<CandleBatch, ProviderError> {
        let mut candles = self.load(instrument)?;

        if self.filter_range {
            let from = range.from.timestamp_millis();
            let to = range.to.timestamp_millis();
            candles.retain(|c| c.timestamp >= from && c.timestamp <= to);
        }

        debug!(symbol = %instrument.symbol, candles = candles.len(), "Loaded CSV candles");

        Ok(CandleBatch {
            candles,
            identifier: instrument.symbol.clone(),
        })
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[async_trait]
impl QuoteProvider for CsvCandleProvider {
    async fn latest_prices(&self, request: &QuoteRequest) -> Result<Vec<LatestPrice>, ProviderError> {
        let mut prices = Vec::new();

        for (exchange, identifiers) in request {
            for identifier in identifiers {
                let instrument = Instrument::new(*exchange, identifier);
                match self.load(&instrument) {
                    Ok(candles) => {
                        if let Some(last) = candles.last() {
                            prices.push(LatestPrice {
                                exchange: *exchange,
                                identifier: identifier.clone(),
                                price: last.close,
                            });
                        }
                    }
                    Err(e) => debug!(%instrument, error = %e, "No quote available"),
                }
            }
        }

        Ok(prices)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

#[async_trait]
impl SessionProvider for CsvCandleProvider {
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(ProviderError::Config(format!(
                "Data directory not found: {}",
                self.dir.display()
            )))
        }
    }
}
