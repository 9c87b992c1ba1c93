//! Stand-in broker used when no credentials could be loaded.

use async_trait::async_trait;
use tracing::debug;

use screener_core::error::ProviderError;
use screener_core::traits::{CandleBatch, CandleProvider, LatestPrice, QuoteProvider, QuoteRequest, SessionProvider};
use screener_core::types::{Instrument, Timeframe, TimeRange};

/// Broker that refuses every call with the reason it could not be built.
///
/// Keeps offline operations (history, fallback candles) usable while scans
/// still fail with a configuration error at the session check.
#[derive(Debug, Clone)]
pub struct UnavailableBroker {
    reason: String,
}

impl UnavailableBroker {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    fn refuse(&self) -> ProviderError {
        ProviderError::Config(self.reason.clone())
    }
}

#[async_trait]
impl SessionProvider for UnavailableBroker {
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        debug!(reason = %self.reason, "Broker unavailable");
        Err(self.refuse())
    }
}

#[async_trait]
impl CandleProvider for UnavailableBroker {
    async fn fetch_candles(
        &self,
        _instrument: &Instrument,
        _timeframe: Timeframe,
        _range: TimeRange,
    ) -> Result<CandleBatch, ProviderError> {
        Err(self.refuse())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[async_trait]
impl QuoteProvider for UnavailableBroker {
    async fn latest_prices(&self, _request: &QuoteRequest) -> Result<Vec<LatestPrice>, ProviderError> {
        Err(self.refuse())
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
