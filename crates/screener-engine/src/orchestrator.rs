//! Watchlist scan orchestration.
//!
//! One pass walks the watchlist in order, one symbol at a time: fetch
//! candles (with retry), annotate, scan for the pattern. Matched symbols are
//! then confirmed with a single bulk live-price request and the run is
//! recorded in the history store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use screener_core::error::{ProviderError, ScreenerError, ScreenerResult};
use screener_core::traits::{CandleBatch, CandleProvider, Clock, QuoteProvider, QuoteRequest, SessionProvider};
use screener_core::types::{
    clamp_window, Exchange, HistoryEntry, Instrument, RangePreset, ScanFailure, ScanParams, ScanResult, ScanRun, Timeframe, TimeRange,
    HISTORY_TRAILING_CANDLES, MAX_WATCHLIST,
};
use screener_data::{HistoryStore, SyntheticSeries};
use screener_indicators::IndicatorEngine;
use screener_pattern::{PatternScanner, ScannerConfig};

use crate::compute::{CandleReport, CandleSource, ComputeRequest};
use crate::retry::RetryPolicy;

/// Tunables of a scan pass.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Pause between consecutive symbols
    pub throttle: Duration,
    /// Fewer candles than this is "insufficient data"
    pub min_candles: usize,
    /// Longer watchlists are truncated
    pub max_watchlist: usize,
    /// Candles kept per result in history
    pub trailing_candles: usize,
    /// Retry policy for candle fetches
    pub retry: RetryPolicy,
    /// Serve generated candles when a single-symbol fetch fails
    pub fallback_on_error: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(250),
            min_candles: 10,
            max_watchlist: MAX_WATCHLIST,
            trailing_candles: HISTORY_TRAILING_CANDLES,
            retry: RetryPolicy::default(),
            fallback_on_error: true,
        }
    }
}

/// Runs watchlist scans against the configured collaborators.
pub struct ScreenerOrchestrator {
    candles: Arc<dyn CandleProvider>,
    quotes: Arc<dyn QuoteProvider>,
    session: Arc<dyn SessionProvider>,
    history: Arc<HistoryStore>,
    clock: Arc<dyn Clock>,
    settings: OrchestratorSettings,
}

impl ScreenerOrchestrator {
    /// Create a new orchestrator with default settings.
    pub fn new(
        candles: Arc<dyn CandleProvider>,
        quotes: Arc<dyn QuoteProvider>,
        session: Arc<dyn SessionProvider>,
        history: Arc<HistoryStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            candles,
            quotes,
            session,
            history,
            clock,
            settings: OrchestratorSettings::default(),
        }
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Scan the watchlist and record matched symbols in history.
    ///
    /// Per-symbol failures end up in that symbol's result. Configuration
    /// failures, session failures and a failed bulk quote request abort the
    /// whole run and nothing is recorded.
    pub async fn run(&self, watchlist: &[Instrument], params: &ScanParams) -> ScreenerResult<ScanRun> {
        let watchlist = self.prepare_watchlist(watchlist)?;
        let params = &ScanParams {
            window: clamp_window(params.window),
            ..params.clone()
        };

        self.session.ensure_session().await.map_err(|e| {
            error!(error = %e, "Session unavailable, aborting run");
            ScreenerError::from(e)
        })?;

        let started_at = self.clock.now();
        let range = params.preset.resolve(started_at);
        let scanner = PatternScanner::new(ScannerConfig::new(params.side, params.breakout_mode));

        info!(
            symbols = watchlist.len(),
            preset = %params.preset,
            timeframe = %params.timeframe,
            indicator = %params.indicator,
            window = params.window,
            side = %params.side,
            breakout_mode = %params.breakout_mode,
            "Starting scan"
        );

        let mut results = Vec::with_capacity(watchlist.len());
        for (i, instrument) in watchlist.iter().enumerate() {
            if i > 0 && !self.settings.throttle.is_zero() {
                tokio::time::sleep(self.settings.throttle).await;
            }

            let result = self.scan_symbol(instrument, params, range, &scanner).await;
            if let Some(failure) = result.error.as_ref().filter(|f| f.kind.is_fatal()) {
                error!(symbol = %instrument.symbol, error = %failure.message, "Fatal error, aborting run");
                return Err(ScreenerError::Config(failure.message.clone()));
            }
            results.push(result);
        }

        if params.confirm_with_live {
            self.confirm_live(&mut results).await?;
        }

        let run = ScanRun {
            params: params.clone(),
            started_at,
            results,
        };

        let entry = HistoryEntry::from_run(&run, self.clock.now(), self.settings.trailing_candles);
        self.history.append(entry).await?;

        info!(
            symbols = run.results.len(),
            matched = run.match_count(),
            "Scan complete"
        );
        Ok(run)
    }

    fn prepare_watchlist(&self, watchlist: &[Instrument]) -> ScreenerResult<Vec<Instrument>> {
        let mut list: Vec<Instrument> = watchlist
            .iter()
            .filter(|i| !i.symbol.trim().is_empty())
            .cloned()
            .collect();

        if list.is_empty() {
            return Err(ScreenerError::Validation("Watchlist is empty".into()));
        }
        let max = self.settings.max_watchlist.min(MAX_WATCHLIST);
        if list.len() > max {
            warn!(requested = list.len(), max, "Watchlist too long, extra symbols ignored");
            list.truncate(max);
        }
        Ok(list)
    }

    async fn scan_symbol(
        &self,
        instrument: &Instrument,
        params: &ScanParams,
        range: TimeRange,
        scanner: &PatternScanner,
    ) -> ScanResult {
        let batch = match self.fetch_with_retry(instrument, params.timeframe, range).await {
            Ok(batch) => batch,
            Err(e) => {
                warn!(
                    symbol = %instrument.symbol,
                    exchange = %instrument.exchange,
                    code = e.code().unwrap_or(""),
                    error = %e,
                    "Candle fetch failed"
                );
                return ScanResult::failed(instrument.clone(), ScanFailure::from(&e));
            }
        };

        let CandleBatch { candles, identifier } = batch;
        debug!(symbol = %instrument.symbol, candles = candles.len(), "Candles received");

        if candles.len() < self.settings.min_candles {
            info!(
                symbol = %instrument.symbol,
                candles = candles.len(),
                required = self.settings.min_candles,
                "Insufficient data"
            );
            return ScanResult::insufficient_data(
                instrument.clone(),
                Some(identifier),
                self.settings.min_candles,
                candles.len(),
            );
        }

        let annotated = IndicatorEngine::compute(&candles, params.indicator, params.window);
        match scanner.scan(&annotated) {
            Some(hit) => {
                info!(
                    symbol = %instrument.symbol,
                    touch = hit.touch_index,
                    breakout = hit.breakout_index,
                    reference_high = hit.reference_high,
                    "Pattern hit"
                );
                ScanResult::matched(instrument.clone(), Some(identifier), hit, annotated)
            }
            None => {
                debug!(symbol = %instrument.symbol, "No pattern");
                ScanResult::no_match(instrument.clone(), Some(identifier))
            }
        }
    }

    async fn fetch_with_retry(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        range: TimeRange,
    ) -> Result<CandleBatch, ProviderError> {
        let provider: &dyn CandleProvider = self.candles.as_ref();
        self.settings
            .retry
            .run(
                move |attempt| {
                    debug!(symbol = %instrument.symbol, attempt, "Fetching candles");
                    provider.fetch_candles(instrument, timeframe, range)
                },
                ProviderError::is_retryable,
            )
            .await
    }

    /// Attach live prices to matched results with one bulk request.
    async fn confirm_live(&self, results: &mut [ScanResult]) -> ScreenerResult<()> {
        let mut request: QuoteRequest = BTreeMap::new();
        for r in results.iter().filter(|r| r.matched) {
            if let Some(id) = &r.identifier {
                let ids = request.entry(r.instrument.exchange).or_default();
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
        }

        if request.is_empty() {
            return Ok(());
        }

        debug!(groups = request.len(), "Requesting live prices");
        let prices = self.quotes.latest_prices(&request).await.map_err(|e| {
            error!(error = %e, "Live price request failed");
            ScreenerError::from(e)
        })?;

        let by_key: HashMap<(Exchange, String), f64> = prices
            .into_iter()
            .map(|p| ((p.exchange, p.identifier), p.price))
            .collect();

        for r in results.iter_mut().filter(|r| r.matched) {
            let quote = r
                .identifier
                .as_ref()
                .and_then(|id| by_key.get(&(r.instrument.exchange, id.clone())).copied());
            r.attach_live_quote(quote);
            debug!(
                symbol = %r.instrument.symbol,
                live_quote = ?r.live_quote,
                live_breakout = ?r.live_breakout,
                "Live confirmation"
            );
        }

        Ok(())
    }

    /// Annotated candles for one instrument.
    ///
    /// With fallback enabled, any provider failure yields a generated series
    /// marked [`CandleSource::Fallback`] that carries the failure.
    pub async fn compute(&self, instrument: &Instrument, request: ComputeRequest) -> ScreenerResult<CandleReport> {
        let now = self.clock.now();
        let range = request.preset.resolve(now);

        let fetched = match self.session.ensure_session().await {
            Ok(()) => self.fetch_with_retry(instrument, request.timeframe, range).await,
            Err(e) => Err(e),
        };

        match fetched {
            Ok(CandleBatch { candles, identifier }) => Ok(CandleReport {
                source: CandleSource::Provider,
                instrument: instrument.clone(),
                identifier: Some(identifier),
                params: request,
                candles: IndicatorEngine::compute(&candles, request.indicator, request.window),
                error: None,
            }),
            Err(e) if self.settings.fallback_on_error => {
                warn!(symbol = %instrument.symbol, error = %e, "Provider failed, serving fallback candles");
                let candles = SyntheticSeries::default().generate(now, request.timeframe);
                Ok(CandleReport {
                    source: CandleSource::Fallback,
                    instrument: instrument.clone(),
                    identifier: None,
                    params: request,
                    candles: IndicatorEngine::compute(&candles, request.indicator, request.window),
                    error: Some(ScanFailure::from(&e)),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`compute`](Self::compute) with the indicator given by name.
    ///
    /// An unknown indicator fails before any provider call.
    pub async fn compute_named(
        &self,
        instrument: &Instrument,
        preset: RangePreset,
        timeframe: Timeframe,
        indicator: &str,
        window: usize,
    ) -> ScreenerResult<CandleReport> {
        let request = ComputeRequest::new(preset, timeframe, indicator, window)?;
        self.compute(instrument, request).await
    }

    /// All stored runs, newest first.
    pub async fn list_history(&self) -> ScreenerResult<Vec<HistoryEntry>> {
        let mut entries = self.history.list().await?;
        entries.reverse();
        Ok(entries)
    }

    /// One stored run by id.
    pub async fn get_history(&self, id: &str) -> ScreenerResult<HistoryEntry> {
        Ok(self.history.get(id).await?)
    }
}
