//! Volatility estimates over a trailing window.
//!
//! Both estimators are recomputed from scratch on every call (no smoothing) and
//! return `None` while history is too short. Callers treat `None` as "not ready",
//! never as zero.

use super::candle::Candle;
use rust_decimal::Decimal;

/// Default lookback for the average candle body
pub const AVG_BODY_LOOKBACK: usize = 20;

/// True range of `curr` against the previous close
pub fn true_range(curr: &Candle, prev_close: Decimal) -> Decimal {
    let hl = curr.high - curr.low;
    let hc = (curr.high - prev_close).abs();
    let lc = (curr.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Average True Range over the last `period` bars.
///
/// Needs `period + 1` candles: every bar in the window is measured against the
/// close before it.
pub fn calculate_atr(candles: &[Candle], period: usize) -> Option<Decimal> {
    if period == 0 || candles.len() < period + 1 {
        return None;
    }

    let window = &candles[candles.len() - period - 1..];
    let sum: Decimal = window
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .sum();

    Some(sum / Decimal::from(period))
}

/// Mean absolute body (`|close - open|`) over the last `lookback` bars
pub fn average_body(candles: &[Candle], lookback: usize) -> Option<Decimal> {
    if lookback == 0 || candles.len() < lookback {
        return None;
    }

    let sum: Decimal = candles[candles.len() - lookback..]
        .iter()
        .map(Candle::body)
        .sum();

    Some(sum / Decimal::from(lookback))
}
