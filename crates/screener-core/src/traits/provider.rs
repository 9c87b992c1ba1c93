//! Collaborator traits for market data and broker sessions.

use crate::error::ProviderError;
use crate::types::{Candle, Exchange, Instrument, Timeframe, TimeRange};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Candles for one instrument together with its provider identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleBatch {
    /// Candles ordered from oldest to newest
    pub candles: Vec<Candle>,
    /// Provider identifier (symbol token) of the instrument
    pub identifier: String,
}

/// Provider identifiers grouped by exchange, for one bulk quote request.
pub type QuoteRequest = BTreeMap<Exchange, Vec<String>>;

/// Latest traded price of one identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestPrice {
    pub exchange: Exchange,
    pub identifier: String,
    pub price: f64,
}

/// Trait for historical candle sources.
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Fetch candles for an instrument.
    ///
    /// # Arguments
    /// * `instrument` - The instrument to fetch
    /// * `timeframe` - The candle interval
    /// * `range` - Start and end of the request window
    ///
    /// # Errors
    /// A classified `ProviderError`; only `Throttled` is worth retrying.
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        range: TimeRange,
    ) -> Result<CandleBatch, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Trait for bulk latest-price lookups.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Get the latest price for every requested identifier the provider knows.
    async fn latest_prices(&self, request: &QuoteRequest) -> Result<Vec<LatestPrice>, ProviderError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Trait for the broker session shared by candle and quote calls.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Make sure a fresh session exists, renewing it when stale.
    ///
    /// Idempotent and safe to call before every batch. Fails with
    /// `ProviderError::Config` when credentials are missing or malformed.
    async fn ensure_session(&self) -> Result<(), ProviderError>;
}
