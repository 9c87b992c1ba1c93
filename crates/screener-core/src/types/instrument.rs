//! Exchanges and tradable instruments.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exchange segment an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    /// National Stock Exchange, cash segment
    #[default]
    Nse,
    /// Bombay Stock Exchange
    Bse,
    /// NSE futures and options
    Nfo,
    /// Multi Commodity Exchange
    Mcx,
}

impl Exchange {
    /// Segment code as used by the broker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Nse => "NSE",
            Exchange::Bse => "BSE",
            Exchange::Nfo => "NFO",
            Exchange::Mcx => "MCX",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NSE" => Ok(Exchange::Nse),
            "BSE" => Ok(Exchange::Bse),
            "NFO" => Ok(Exchange::Nfo),
            "MCX" => Ok(Exchange::Mcx),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}

/// A tradable instrument on an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    pub exchange: Exchange,
    /// Trading symbol, upper-cased (e.g. `SBIN-EQ`)
    pub symbol: String,
}

impl Instrument {
    /// Create an instrument, normalising the symbol to upper case.
    pub fn new(exchange: Exchange, symbol: impl AsRef<str>) -> Self {
        Self {
            exchange,
            symbol: symbol.as_ref().trim().to_uppercase(),
        }
    }

    /// Create an NSE instrument.
    pub fn nse(symbol: impl AsRef<str>) -> Self {
        Self::new(Exchange::Nse, symbol)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

impl FromStr for Instrument {
    type Err = String;

    /// Parse `EXCHANGE:SYMBOL`, or a bare `SYMBOL` on NSE.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (exchange, symbol) = match s.split_once(':') {
            Some((ex, sym)) => (ex.parse()?, sym),
            None => (Exchange::Nse, s),
        };
        if symbol.trim().is_empty() {
            return Err(format!("Missing symbol in '{}'", s));
        }
        Ok(Instrument::new(exchange, symbol))
    }
}
