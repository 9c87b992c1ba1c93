//! Per-candle predicates used by the scanner.

use screener_core::types::{Candle, Side};

/// Whether the candle's range contains `level`, or its body crosses it.
#[inline]
pub fn touched_indicator(candle: &Candle, level: f64) -> bool {
    let within = candle.low <= level && level <= candle.high;
    let crossed_down = candle.open > level && candle.close < level;
    let crossed_up = candle.open < level && candle.close > level;
    within || crossed_down || crossed_up
}

/// Whether all four OHLC prices lie strictly on `side` of `level`.
#[inline]
pub fn is_all_one_side(candle: &Candle, level: f64, side: Side) -> bool {
    let prices = candle.prices();
    match side {
        Side::Above => prices.iter().all(|&p| p > level),
        Side::Below => prices.iter().all(|&p| p < level),
    }
}
