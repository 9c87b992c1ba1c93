//! Core types and traits for the screener.
//!
//! This crate provides the foundational building blocks including:
//! - Market data types (Candle, AnnotatedCandle)
//! - Scan parameters, pattern hits and per-symbol scan results
//! - The error taxonomy shared by every layer
//! - Collaborator traits for candle, quote and session providers

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, ScreenerError, ScreenerResult};
pub use traits::*;
pub use types::*;
