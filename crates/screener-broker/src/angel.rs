//! Angel One SmartAPI market data client.
//!
//! Candles come from the historical `getCandleData` endpoint and live prices
//! from the LTP quote endpoint. Every request carries a bearer token from a
//! [`SessionManager`] that logs in with client code, MPIN and a TOTP.
//!
//! Failures are classified here, once: error code `AB1004` or HTTP 429 is
//! [`ProviderError::Throttled`], everything else is `Upstream`.

use async_trait::async_trait;
use chrono::{DateTime, Duration};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use screener_core::error::ProviderError;
use screener_core::traits::{
    CandleBatch, CandleProvider, Clock, LatestPrice, QuoteProvider, QuoteRequest, SessionProvider,
};
use screener_core::types::{Candle, Exchange, Instrument, Timeframe, TimeRange};

use crate::scrip_master::{ScripMaster, DEFAULT_SCRIP_MASTER_URL};
use crate::session::{Authenticator, SessionManager, DEFAULT_SESSION_TTL_SECS};
use crate::totp::Totp;

/// Rate-limit error code returned by SmartAPI.
pub const THROTTLE_CODE: &str = "AB1004";

const LOGIN_PATH: &str = "/rest/auth/angelbroking/user/v1/loginByPassword";
const CANDLE_PATH: &str = "/rest/secure/angelbroking/historical/v1/getCandleData";
const QUOTE_PATH: &str = "/rest/secure/angelbroking/market/v1/quote/";

/// Codes meaning the bearer token is no longer accepted.
const INVALID_TOKEN_CODES: [&str; 2] = ["AG8001", "AG8002"];

/// Angel One API configuration.
#[derive(Debug, Clone)]
pub struct AngelConfig {
    pub base_url: String,
    pub scrip_master_url: String,
    pub session_ttl_secs: i64,
    pub timeout_secs: u64,
}

impl Default for AngelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apiconnect.angelbroking.com".to_string(),
            scrip_master_url: DEFAULT_SCRIP_MASTER_URL.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            timeout_secs: 30,
        }
    }
}

/// Names of the environment variables holding credentials.
#[derive(Debug, Clone)]
pub struct CredentialVars {
    pub api_key: String,
    pub client_code: String,
    pub mpin: String,
    pub totp_secret: String,
}

impl Default for CredentialVars {
    fn default() -> Self {
        Self {
            api_key: "ANGEL_API_KEY".to_string(),
            client_code: "ANGEL_CLIENT_CODE".to_string(),
            mpin: "ANGEL_MPIN".to_string(),
            totp_secret: "ANGEL_TOTP_SECRET".to_string(),
        }
    }
}

/// Login credentials.
#[derive(Clone)]
pub struct AngelCredentials {
    pub api_key: String,
    pub client_code: String,
    pub mpin: String,
    totp: Totp,
}

impl std::fmt::Debug for AngelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AngelCredentials")
            .field("client_code", &self.client_code)
            .finish_non_exhaustive()
    }
}

impl AngelCredentials {
    /// Validate and build credentials.
    pub fn new(
        api_key: impl Into<String>,
        client_code: impl Into<String>,
        mpin: impl Into<String>,
        totp_secret: &str,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        let client_code = client_code.into();
        let mpin = mpin.into();

        if api_key.trim().is_empty() || client_code.trim().is_empty() {
            return Err(ProviderError::Config("API key and client code are required".into()));
        }
        if mpin.len() != 4 || !mpin.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProviderError::Config("MPIN must be exactly 4 digits".into()));
        }
        let totp = Totp::from_base32(totp_secret)?;

        Ok(Self {
            api_key,
            client_code,
            mpin,
            totp,
        })
    }

    /// Load from the named environment variables.
    pub fn from_env(vars: &CredentialVars) -> Result<Self, ProviderError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ProviderError::Config(format!("{} not set", name)))
        };

        let api_key = read(&vars.api_key)?;
        let client_code = read(&vars.client_code)?;
        let mpin = read(&vars.mpin)?;
        let totp_secret = read(&vars.totp_secret)?;

        Self::new(api_key, client_code, mpin, &totp_secret)
    }
}

/// SmartAPI response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(default, rename = "errorcode")]
    error_code: String,
    data: Option<T>,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    clientcode: &'a str,
    password: &'a str,
    totp: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(rename = "jwtToken")]
    jwt_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct CandleRequest<'a> {
    exchange: &'a str,
    symboltoken: &'a str,
    interval: &'a str,
    fromdate: String,
    todate: String,
}

#[derive(Debug, Serialize)]
struct QuoteBody<'a> {
    mode: &'a str,
    #[serde(rename = "exchangeTokens")]
    exchange_tokens: BTreeMap<&'a str, &'a [String]>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    fetched: Vec<FetchedQuote>,
}

#[derive(Debug, Deserialize)]
struct FetchedQuote {
    exchange: String,
    #[serde(rename = "symbolToken")]
    symbol_token: String,
    ltp: f64,
}

/// Classify a failed SmartAPI call.
pub fn classify(status: StatusCode, code: &str, message: &str) -> ProviderError {
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message.to_string()
    };

    if code == THROTTLE_CODE {
        return ProviderError::Throttled {
            code: code.to_string(),
            message,
        };
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::Throttled {
            code: status.as_u16().to_string(),
            message,
        };
    }
    if code.is_empty() {
        ProviderError::Upstream { code: None, message }
    } else {
        ProviderError::upstream_with_code(code, message)
    }
}

/// Parse one `[time, open, high, low, close, volume]` row.
fn parse_candle_row(row: &[serde_json::Value]) -> Option<Candle> {
    let time = row.first()?.as_str()?;
    let timestamp = DateTime::parse_from_rfc3339(time).ok()?.timestamp_millis();
    let num = |i: usize| row.get(i).and_then(serde_json::Value::as_f64);
    let volume = row.get(5).and_then(serde_json::Value::as_f64).unwrap_or(0.0);

    Some(Candle::new(
        timestamp,
        num(1)?,
        num(2)?,
        num(3)?,
        num(4)?,
        volume.max(0.0).round() as u64,
    ))
}

fn default_headers(api_key: &str) -> Result<header::HeaderMap, ProviderError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
    headers.insert("X-UserType", header::HeaderValue::from_static("USER"));
    headers.insert("X-SourceID", header::HeaderValue::from_static("WEB"));
    headers.insert("X-ClientLocalIP", header::HeaderValue::from_static("127.0.0.1"));
    headers.insert("X-ClientPublicIP", header::HeaderValue::from_static("127.0.0.1"));
    headers.insert("X-MACAddress", header::HeaderValue::from_static("00:00:00:00:00:00"));
    headers.insert(
        "X-PrivateKey",
        header::HeaderValue::from_str(api_key).map_err(|e| ProviderError::Config(e.to_string()))?,
    );
    Ok(headers)
}

async fn post_json<B: Serialize, T: DeserializeOwned>(
    http: &Client,
    url: &str,
    bearer: Option<&str>,
    body: &B,
) -> Result<T, ProviderError> {
    let mut request = http.post(url).json(body);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let resp = request
        .send()
        .await
        .map_err(|e| ProviderError::upstream(format!("Request to {} failed: {}", url, e)))?;

    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();

    let parsed: Option<ApiResponse<T>> = serde_json::from_str(&text).ok();
    match parsed {
        Some(api) if status.is_success() && api.status => api
            .data
            .ok_or_else(|| ProviderError::upstream(format!("Empty response from {}", url))),
        Some(api) => Err(classify(status, &api.error_code, &api.message)),
        None => Err(classify(status, "", text.trim())),
    }
}

/// Logs in with client code, MPIN and the current TOTP.
pub struct AngelAuthenticator {
    http: Client,
    login_url: String,
    credentials: AngelCredentials,
    clock: Arc<dyn Clock>,
}

#[async_trait]
impl Authenticator for AngelAuthenticator {
    async fn authenticate(&self) -> Result<String, ProviderError> {
        let totp = self.credentials.totp.code_at(self.clock.now().timestamp());
        let body = LoginRequest {
            clientcode: &self.credentials.client_code,
            password: &self.credentials.mpin,
            totp: &totp,
        };

        let data: LoginData = post_json(&self.http, &self.login_url, None, &body).await?;
        data.jwt_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::upstream("Login succeeded but no token returned"))
    }
}

/// Angel One client implementing the candle, quote and session traits.
pub struct AngelOneClient {
    http: Client,
    config: AngelConfig,
    session: SessionManager<AngelAuthenticator>,
    scrip_master: ScripMaster,
}

impl AngelOneClient {
    /// Create a new client.
    pub fn new(
        config: AngelConfig,
        credentials: AngelCredentials,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .default_headers(default_headers(&credentials.api_key)?)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let authenticator = AngelAuthenticator {
            http: http.clone(),
            login_url: format!("{}{}", config.base_url, LOGIN_PATH),
            credentials,
            clock: Arc::clone(&clock),
        };
        let session = SessionManager::new(
            authenticator,
            Arc::clone(&clock),
            Duration::seconds(config.session_ttl_secs),
        );
        let scrip_master = ScripMaster::new(http.clone(), config.scrip_master_url.clone(), clock);

        Ok(Self {
            http,
            config,
            session,
            scrip_master,
        })
    }

    /// Create from environment credentials.
    pub fn from_env(
        config: AngelConfig,
        vars: &CredentialVars,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ProviderError> {
        Self::new(config, AngelCredentials::from_env(vars)?, clock)
    }

    /// Instrument master used to resolve symbol tokens.
    pub fn scrip_master(&self) -> &ScripMaster {
        &self.scrip_master
    }

    async fn secure_post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProviderError> {
        let token = self.session.ensure_fresh().await?;
        let url = format!("{}{}", self.config.base_url, path);

        match post_json(&self.http, &url, Some(&token), body).await {
            Err(ProviderError::Upstream { code: Some(code), .. })
                if INVALID_TOKEN_CODES.contains(&code.as_str()) =>
            {
                warn!(code = %code, "Session rejected, logging in again");
                self.session.invalidate().await;
                let token = self.session.ensure_fresh().await?;
                post_json(&self.http, &url, Some(&token), body).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl SessionProvider for AngelOneClient {
    async fn ensure_session(&self) -> Result<(), ProviderError> {
        self.session.ensure_session().await
    }
}

#[async_trait]
impl CandleProvider for AngelOneClient {
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: Timeframe,
        range: TimeRange,
    ) -> Result<CandleBatch, ProviderError> {
        let token = self.scrip_master.resolve(instrument).await?;

        let body = CandleRequest {
            exchange: instrument.exchange.as_str(),
            symboltoken: &token,
            interval: timeframe.interval_name(),
            fromdate: range.from_local(),
            todate: range.to_local(),
        };
        debug!(
            %instrument,
            token = %token,
            interval = body.interval,
            from = %body.fromdate,
            to = %body.todate,
            "Fetching candles"
        );

        let rows: Vec<Vec<serde_json::Value>> = self.secure_post(CANDLE_PATH, &body).await?;
        let candles = rows
            .iter()
            .map(|row| {
                parse_candle_row(row)
                    .ok_or_else(|| ProviderError::upstream(format!("Malformed candle row: {:?}", row)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CandleBatch {
            candles,
            identifier: token,
        })
    }

    fn name(&self) -> &str {
        "angel_one"
    }
}

#[async_trait]
impl QuoteProvider for AngelOneClient {
    async fn latest_prices(&self, request: &QuoteRequest) -> Result<Vec<LatestPrice>, ProviderError> {
        let exchange_tokens: BTreeMap<&str, &[String]> = request
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(ex, ids)| (ex.as_str(), ids.as_slice()))
            .collect();

        if exchange_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let body = QuoteBody {
            mode: "LTP",
            exchange_tokens,
        };
        let data: QuoteData = self.secure_post(QUOTE_PATH, &body).await?;

        Ok(data
            .fetched
            .into_iter()
            .filter_map(|q| {
                let exchange: Exchange = q.exchange.parse().ok()?;
                Some(LatestPrice {
                    exchange,
                    identifier: q.symbol_token,
                    price: q.ltp,
                })
            })
            .collect())
    }

    fn name(&self) -> &str {
        "angel_one"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::error::ErrorKind;

    #[test]
    fn test_classify_throttle_code() {
        let err = classify(StatusCode::OK, "AB1004", "Something Went Wrong, Please Try After Sometime");
        assert_eq!(err.kind(), ErrorKind::Throttled);
        assert_eq!(err.code(), Some("AB1004"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_http_429() {
        let err = classify(StatusCode::TOO_MANY_REQUESTS, "", "");
        assert_eq!(err.kind(), ErrorKind::Throttled);
        assert_eq!(err.code(), Some("429"));
    }

    #[test]
    fn test_classify_other_errors() {
        let err = classify(StatusCode::OK, "AB1019", "Invalid interval");
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.code(), Some("AB1019"));
        assert!(!err.is_retryable());

        let err = classify(StatusCode::INTERNAL_SERVER_ERROR, "", "");
        assert_eq!(err.kind(), ErrorKind::Provider);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_parse_candle_row() {
        let row: Vec<serde_json::Value> =
            serde_json::from_str(r#"["2024-03-05T09:15:00+05:30", 760.5, 762.0, 759.1, 761.25, 184523]"#).unwrap();
        let candle = parse_candle_row(&row).unwrap();

        assert_eq!(candle.timestamp, 1_709_610_300_000);
        assert_eq!(candle.open, 760.5);
        assert_eq!(candle.close, 761.25);
        assert_eq!(candle.volume, 184_523);

        let short: Vec<serde_json::Value> = serde_json::from_str(r#"["2024-03-05T09:15:00+05:30", 1.0]"#).unwrap();
        assert!(parse_candle_row(&short).is_none());
    }

    #[test]
    fn test_envelope_parsing() {
        let json = r#"{"status":false,"message":"Access denied because of exceeding access rate","errorcode":"AB1004","data":null}"#;
        let api: ApiResponse<QuoteData> = serde_json::from_str(json).unwrap();
        assert!(!api.status);
        assert_eq!(api.error_code, "AB1004");

        let json = r#"{"status":true,"message":"SUCCESS","errorcode":"","data":{"fetched":[{"exchange":"NSE","tradingSymbol":"SBIN-EQ","symbolToken":"3045","ltp":771.3}],"unfetched":[]}}"#;
        let api: ApiResponse<QuoteData> = serde_json::from_str(json).unwrap();
        let fetched = &api.data.unwrap().fetched;
        assert_eq!(fetched[0].symbol_token, "3045");
        assert_eq!(fetched[0].ltp, 771.3);
    }

    #[test]
    fn test_quote_body_shape() {
        let ids = vec!["3045".to_string(), "2885".to_string()];
        let mut tokens = BTreeMap::new();
        tokens.insert("NSE", ids.as_slice());
        let body = QuoteBody {
            mode: "LTP",
            exchange_tokens: tokens,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "LTP");
        assert_eq!(json["exchangeTokens"]["NSE"][1], "2885");
    }

    #[test]
    fn test_credentials_validation() {
        let secret = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

        assert!(AngelCredentials::new("key", "A123", "1234", secret).is_ok());

        let err = AngelCredentials::new("key", "A123", "12345", secret).unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
        assert!(AngelCredentials::new("key", "A123", "12a4", secret).is_err());
        assert!(AngelCredentials::new("", "A123", "1234", secret).is_err());
        assert!(AngelCredentials::new("key", "A123", "1234", "!!").is_err());
    }

    #[test]
    fn test_credentials_from_env_missing() {
        let vars = CredentialVars {
            api_key: "SCREENER_TEST_UNSET_API_KEY_9F2".into(),
            ..CredentialVars::default()
        };
        let err = AngelCredentials::from_env(&vars).unwrap_err();
        assert!(matches!(err, ProviderError::Config(msg) if msg.contains("SCREENER_TEST_UNSET_API_KEY_9F2")));
    }
}
