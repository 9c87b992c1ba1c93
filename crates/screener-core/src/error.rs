//! Error types for the screener.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of a failure, independent of where it was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed credentials/configuration. Fatal for a run.
    Config,
    /// Provider rate limit. Retried, then reported per symbol.
    Throttled,
    /// Symbol could not be mapped to a provider identifier.
    NotResolvable,
    /// Any other upstream failure.
    Provider,
    /// Too few candles returned for a scan.
    InsufficientData,
    /// Indicator kind not supported by the engine.
    UnsupportedIndicator,
}

impl ErrorKind {
    /// Whether an error of this kind aborts a whole batch run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Config)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Config => "config",
            ErrorKind::Throttled => "throttled",
            ErrorKind::NotResolvable => "not_resolvable",
            ErrorKind::Provider => "provider",
            ErrorKind::InsufficientData => "insufficient_data",
            ErrorKind::UnsupportedIndicator => "unsupported_indicator",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised by candle, quote and session providers.
///
/// The variant is chosen once, at the provider boundary. Downstream code
/// inspects `kind()` and `code()` and never re-parses the message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited ({code}): {message}")]
    Throttled { code: String, message: String },

    #[error("Symbol not resolvable: {exchange}:{symbol}")]
    NotResolvable { exchange: String, symbol: String },

    #[error("Upstream error{}: {message}", code_suffix(.code))]
    Upstream {
        code: Option<String>,
        message: String,
    },
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default()
}

impl ProviderError {
    /// Create an upstream error without a provider code.
    pub fn upstream(message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            code: None,
            message: message.into(),
        }
    }

    /// Create an upstream error carrying a provider code.
    pub fn upstream_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Upstream {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Get the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Config(_) => ErrorKind::Config,
            ProviderError::Throttled { .. } => ErrorKind::Throttled,
            ProviderError::NotResolvable { .. } => ErrorKind::NotResolvable,
            ProviderError::Upstream { .. } => ErrorKind::Provider,
        }
    }

    /// Get the provider error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            ProviderError::Throttled { code, .. } => Some(code),
            ProviderError::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Only throttled failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Throttled { .. })
    }
}

/// Indicator computation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Unsupported indicator: {0}")]
    Unsupported(String),
}

/// History store errors.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History entry not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Top-level screener error.
#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Insufficient data: need {required} candles, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl ScreenerError {
    /// Get the classification of this error, when it maps onto one.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ScreenerError::Config(_) => Some(ErrorKind::Config),
            ScreenerError::Provider(e) => Some(e.kind()),
            ScreenerError::Indicator(_) => Some(ErrorKind::UnsupportedIndicator),
            ScreenerError::InsufficientData { .. } => Some(ErrorKind::InsufficientData),
            ScreenerError::History(_) | ScreenerError::Validation(_) => None,
        }
    }
}

/// Result type alias for screener operations.
pub type ScreenerResult<T> = Result<T, ScreenerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        let throttled = ProviderError::Throttled {
            code: "AB1004".into(),
            message: "Too many requests".into(),
        };
        assert_eq!(throttled.kind(), ErrorKind::Throttled);
        assert_eq!(throttled.code(), Some("AB1004"));
        assert!(throttled.is_retryable());

        let upstream = ProviderError::upstream_with_code("AB2001", "Internal error");
        assert_eq!(upstream.kind(), ErrorKind::Provider);
        assert!(!upstream.is_retryable());

        let unresolved = ProviderError::NotResolvable {
            exchange: "NSE".into(),
            symbol: "NOPE-EQ".into(),
        };
        assert_eq!(unresolved.kind(), ErrorKind::NotResolvable);
        assert!(unresolved.code().is_none());
    }

    #[test]
    fn test_upstream_display() {
        assert_eq!(
            ProviderError::upstream_with_code("AB1010", "bad token").to_string(),
            "Upstream error (AB1010): bad token"
        );
        assert_eq!(ProviderError::upstream("boom").to_string(), "Upstream error: boom");
    }

    #[test]
    fn test_screener_error_kind() {
        let err: ScreenerError = ProviderError::Config("missing key".into()).into();
        assert_eq!(err.kind(), Some(ErrorKind::Config));
        assert!(err.kind().unwrap().is_fatal());

        let err: ScreenerError = IndicatorError::Unsupported("RSI".into()).into();
        assert_eq!(err.kind(), Some(ErrorKind::UnsupportedIndicator));
        assert!(!ErrorKind::Throttled.is_fatal());
    }

    #[test]
    fn test_error_kind_serde() {
        let json = serde_json::to_string(&ErrorKind::NotResolvable).unwrap();
        assert_eq!(json, "\"not_resolvable\"");
    }
}
