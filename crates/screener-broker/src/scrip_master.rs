//! Symbol token lookup from the broker's instrument master file.

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use screener_core::error::ProviderError;
use screener_core::traits::Clock;
use screener_core::types::{Exchange, Instrument};

/// Public instrument master published by Angel One.
pub const DEFAULT_SCRIP_MASTER_URL: &str =
    "https://margincalculator.angelbroking.com/OpenAPI_File/files/OpenAPIScripMaster.json";

/// One row of the master file. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ScripRow {
    pub token: String,
    pub symbol: String,
    pub exch_seg: String,
}

type TokenIndex = HashMap<Instrument, String>;

/// Index rows by instrument, skipping segments the screener does not scan.
pub fn index_rows(rows: impl IntoIterator<Item = ScripRow>) -> HashMap<Instrument, String> {
    rows.into_iter()
        .filter_map(|row| {
            let exchange: Exchange = row.exch_seg.parse().ok()?;
            Some((Instrument::new(exchange, &row.symbol), row.token))
        })
        .collect()
}

struct Cached {
    fetched_at: DateTime<Utc>,
    index: Arc<TokenIndex>,
}

/// Resolves instruments to symbol tokens, refreshing the master daily.
pub struct ScripMaster {
    http: Client,
    url: String,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache: Mutex<Option<Cached>>,
}

impl ScripMaster {
    pub fn new(http: Client, url: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            http,
            url: url.into(),
            clock,
            ttl: Duration::days(1),
            cache: Mutex::new(None),
        }
    }

    /// Pre-load the cache with known rows.
    pub async fn seed(&self, rows: impl IntoIterator<Item = ScripRow>) {
        *self.cache.lock().await = Some(Cached {
            fetched_at: self.clock.now(),
            index: Arc::new(index_rows(rows)),
        });
    }

    async fn index(&self) -> Result<Arc<TokenIndex>, ProviderError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if self.clock.now() - cached.fetched_at < self.ttl {
                return Ok(Arc::clone(&cached.index));
            }
        }

        info!(url = %self.url, "Fetching scrip master");
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ProviderError::upstream(format!("Scrip master request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(ProviderError::upstream_with_code(
                status.as_u16().to_string(),
                format!("Failed to load scrip master: {}", status),
            ));
        }

        let rows: Vec<ScripRow> = resp
            .json()
            .await
            .map_err(|e| ProviderError::upstream(format!("Failed to parse scrip master: {}", e)))?;
        info!(entries = rows.len(), "Scrip master loaded");

        let index = Arc::new(index_rows(rows));
        *cache = Some(Cached {
            fetched_at: self.clock.now(),
            index: Arc::clone(&index),
        });
        Ok(index)
    }

    /// Symbol token for `instrument`.
    pub async fn resolve(&self, instrument: &Instrument) -> Result<String, ProviderError> {
        let index = self.index().await?;
        let token = index.get(instrument).cloned().ok_or_else(|| ProviderError::NotResolvable {
            exchange: instrument.exchange.to_string(),
            symbol: instrument.symbol.clone(),
        })?;
        debug!(%instrument, token = %token, "Resolved symbol token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use screener_core::traits::ManualClock;

    fn row(token: &str, symbol: &str, exch_seg: &str) -> ScripRow {
        ScripRow {
            token: token.into(),
            symbol: symbol.into(),
            exch_seg: exch_seg.into(),
        }
    }

    #[test]
    fn test_index_rows() {
        let index = index_rows(vec![
            row("3045", "SBIN-EQ", "NSE"),
            row("500112", "SBIN", "bse"),
            row("1", "CDS-THING", "CDS"),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index[&Instrument::nse("sbin-eq")], "3045");
        assert_eq!(index[&Instrument::new(Exchange::Bse, "SBIN")], "500112");
    }

    #[test]
    fn test_master_row_deserializes() {
        let json = r#"[{"token":"2885","symbol":"RELIANCE-EQ","name":"RELIANCE","expiry":"","strike":"-1.000000","lotsize":"1","instrumenttype":"","exch_seg":"NSE","tick_size":"5.000000"}]"#;
        let rows: Vec<ScripRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].token, "2885");
        assert_eq!(rows[0].exch_seg, "NSE");
    }

    #[tokio::test]
    async fn test_resolve_from_seeded_cache() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 5, 4, 0, 0).unwrap()));
        // unroutable URL: any fetch would fail
        let master = ScripMaster::new(Client::new(), "http://127.0.0.1:9/master.json", clock.clone());
        master.seed(vec![row("3045", "SBIN-EQ", "NSE")]).await;

        assert_eq!(master.resolve(&Instrument::nse("SBIN-EQ")).await.unwrap(), "3045");

        let err = master.resolve(&Instrument::nse("UNKNOWN-EQ")).await.unwrap_err();
        assert!(matches!(err, ProviderError::NotResolvable { ref symbol, .. } if symbol == "UNKNOWN-EQ"));

        clock.advance(Duration::hours(23));
        assert!(master.resolve(&Instrument::nse("SBIN-EQ")).await.is_ok());
    }
}
