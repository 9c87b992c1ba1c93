//! In-memory market for orchestrator tests.
//!
//! Candle responses are scripted per symbol; every call is recorded so tests
//! can assert on call counts and ordering.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use screener_core::error::ProviderError;
use screener_core::traits::{
    CandleBatch, CandleProvider, LatestPrice, ManualClock, QuoteProvider, QuoteRequest, SessionProvider,
};
use screener_core::types::{Candle, Instrument, Timeframe, TimeRange};
use screener_data::HistoryStore;
use screener_engine::ScreenerOrchestrator;

type Scripted = Result<Vec<Candle>, ProviderError>;

/// A deterministic candle, quote and session provider.
#[derive(Default)]
pub struct MockMarket {
    /// Responses consumed in order; the last one repeats
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    prices: Mutex<HashMap<String, f64>>,
    session_error: Mutex<Option<ProviderError>>,
    quote_error: Mutex<Option<ProviderError>>,
    candle_calls: Mutex<Vec<String>>,
    quote_requests: Mutex<Vec<QuoteRequest>>,
}

impl MockMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Serve `candles` for `symbol` on every request.
    pub fn with_candles(&self, symbol: &str, candles: Vec<Candle>) {
        self.script(symbol, vec![Ok(candles)]);
    }

    /// Serve the given responses for `symbol`, one per request.
    pub fn script(&self, symbol: &str, responses: Vec<Scripted>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(symbol.to_string(), responses.into());
    }

    pub fn with_price(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(token_for(symbol), price);
    }

    pub fn fail_session(&self, err: ProviderError) {
        *self.session_error.lock().unwrap() = Some(err);
    }

    pub fn fail_quotes(&self, err: ProviderError) {
        *self.quote_error.lock().unwrap() = Some(err);
    }

    pub fn candle_calls(&self) -> Vec<String> {
        self.candle_calls.lock().unwrap().clone()
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        self.quote_requests.lock().unwrap().clone()
    }
}

/// Identifier the mock hands out for a symbol.
pub fn token_for(symbol: &str) -> String {
    format!("T-{}", symbol)
}

#[async_trait]
impl CandleProvider for MockMarket {
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        _timeframe: Timeframe,
        _range: TimeRange,
    ) -> Result<CandleBatch, ProviderError> {
        self.candle_calls.lock().unwrap().push(instrument.symbol.clone());

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(&instrument.symbol).ok_or_else(|| ProviderError::NotResolvable {
            exchange: instrument.exchange.to_string(),
            symbol: instrument.symbol.clone(),
        })?;

        let response = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };

        response.map(|candles| CandleBatch {
            candles,
            identifier: token_for(&instrument.symbol),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl QuoteProvider for MockMarket {
    async fn latest_prices(&self, request: &QuoteRequest) -> Result<Vec<LatestPrice>, ProviderError> {
        self.quote_requests.lock().unwrap().push(request.clone());

        if let Some(err) = self.quote_error.lock().unwrap().clone() {
            return Err(err);
        }

        let prices = self.prices.lock().unwrap();
        Ok(request
            .iter()
            .flat_map(|(exchange, ids)| {
                ids.iter().filter_map(|id| {
                    prices.get(id).map(|&price| LatestPrice {
                        exchange: *exchange,
                        identifier: id.clone(),
                        price,
                    })
                })
            })
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[async_trait]
impl SessionProvider for MockMarket {
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        match self.session_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).unwrap()))
}

/// Orchestrator over `market` with an in-memory history store.
pub fn orchestrator(market: &Arc<MockMarket>) -> (ScreenerOrchestrator, Arc<HistoryStore>) {
    let history = Arc::new(HistoryStore::in_memory());
    let orch = ScreenerOrchestrator::new(
        market.clone(),
        market.clone(),
        market.clone(),
        Arc::clone(&history),
        clock(),
    );
    (orch, history)
}

fn candle(i: i64, o: f64, h: f64, l: f64, c: f64) -> Candle {
    Candle::new(1_709_610_300_000 + i * 60_000, o, h, l, c, 100)
}

/// Twelve one-minute candles, volume 100. With SMA(2), BELOW and CLOSE the
/// pattern is touch 3, side 4, breakout 7 with reference high 124.
pub fn breakout_candles() -> Vec<Candle> {
    vec![
        candle(0, 100.0, 101.0, 99.0, 100.0),
        candle(1, 120.0, 122.0, 119.0, 121.0),
        candle(2, 121.0, 123.0, 120.0, 122.0),
        candle(3, 122.0, 124.0, 121.0, 123.0),
        candle(4, 112.0, 113.0, 109.0, 110.0),
        candle(5, 110.0, 112.0, 108.0, 111.0),
        candle(6, 111.0, 125.0, 110.0, 112.0),
        candle(7, 112.0, 127.0, 111.0, 126.0),
        candle(8, 126.0, 128.0, 125.0, 127.0),
        candle(9, 127.0, 129.0, 126.0, 128.0),
        candle(10, 128.0, 130.0, 127.0, 129.0),
        candle(11, 129.0, 131.0, 128.0, 130.0),
    ]
}

/// Strictly rising candles that never touch a two-candle SMA.
pub fn trending_candles(n: usize) -> Vec<Candle> {
    (0..n as i64)
        .map(|i| {
            let base = 100.0 + i as f64 * 10.0;
            candle(i, base, base + 1.0, base - 1.0, base + 0.5)
        })
        .collect()
}

pub fn throttled() -> ProviderError {
    ProviderError::Throttled {
        code: "AB1004".into(),
        message: "Access denied because of exceeding access rate".into(),
    }
}
