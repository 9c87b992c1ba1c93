//! Core traits for the screener.

mod clock;
mod indicator;
mod provider;

pub use clock::{Clock, ManualClock, SystemClock};
pub use indicator::Indicator;
pub use provider::{
    CandleBatch, CandleProvider, LatestPrice, QuoteProvider, QuoteRequest, SessionProvider,
};
