//! Three-candle indicator breakout pattern.
//!
//! A scan looks for a candle that touches its indicator, followed
//! immediately by a candle sitting entirely on one side of it, followed
//! later by a candle whose close (or high) clears the touch candle's high.

mod conditions;
mod scanner;

pub use conditions::{is_all_one_side, touched_indicator};
pub use scanner::{PatternScanner, ScannerConfig};
