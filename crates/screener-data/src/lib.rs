//! Persistence and offline data sources for the screener.

mod csv_source;
mod history;
mod synthetic;

pub use csv_source::CsvCandleProvider;
pub use history::{HistoryBackend, HistoryStore, JsonFileBackend, MemoryBackend, DEFAULT_MAX_HISTORY};
pub use synthetic::SyntheticSeries;
