use super::types::StfSnapshot;
use crate::domain::market::candle::CandleBatch;
use crate::domain::market::volatility::calculate_atr;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Trailing candles summarised by the snapshot
    pub window: usize,
    /// Candles requested from the source each cycle
    pub fetch_limit: usize,
    pub atr_period: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            window: 180,
            fetch_limit: 250,
            atr_period: 14,
        }
    }
}

/// Summarises the signal timeframe. `None` when the batch is empty or the last
/// close is zero.
pub fn build_stf_snapshot(batch: &CandleBatch, config: &SnapshotConfig) -> Option<StfSnapshot> {
    let candles = &batch.candles;
    let window = &candles[candles.len().saturating_sub(config.window)..];
    let last = window.last()?;
    if last.close <= Decimal::ZERO {
        return None;
    }

    let impulse_pct = window
        .iter()
        .filter(|c| c.open > Decimal::ZERO)
        .filter_map(|c| (c.range() / c.open).to_f64())
        .fold(0.0_f64, f64::max);

    let max_high = window.iter().map(|c| c.high).max()?;
    let min_low = window.iter().map(|c| c.low).min()?;
    let range_pct = ((max_high - min_low) / last.close).to_f64().unwrap_or(0.0);

    let volatility = calculate_atr(window, config.atr_period)
        .and_then(|atr| (atr / last.close).to_f64())
        .unwrap_or(0.0);

    Some(StfSnapshot {
        candle_count: candles.len(),
        impulse_pct,
        range_pct,
        volatility,
        candles: window.to_vec(),
        health: batch.health,
    })
}
