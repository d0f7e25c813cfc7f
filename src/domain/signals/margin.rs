use super::types::StfSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Thresholds of the impulse requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginConfig {
    pub min_candles: usize,
    pub min_impulse_pct: f64,
    /// Window range must be at least this multiple of the impulse
    pub range_to_impulse: f64,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            min_candles: 180,
            min_impulse_pct: 0.0167,
            range_to_impulse: 1.2,
        }
    }
}

/// First check that disqualified a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginRejection {
    NotEnoughCandles,
    ImpulseTooSmall,
    RangeTooNarrow,
    NoVolatility,
}

impl fmt::Display for MarginRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginRejection::NotEnoughCandles => write!(f, "not enough candles"),
            MarginRejection::ImpulseTooSmall => write!(f, "impulse too small"),
            MarginRejection::RangeTooNarrow => write!(f, "range too narrow for impulse"),
            MarginRejection::NoVolatility => write!(f, "no volatility"),
        }
    }
}

/// Hard pre-filter run before the gate. Checks are evaluated in order and the
/// first failure is returned.
pub fn check_margin(snapshot: &StfSnapshot, config: &MarginConfig) -> Result<(), MarginRejection> {
    if snapshot.candle_count < config.min_candles {
        return Err(MarginRejection::NotEnoughCandles);
    }
    if snapshot.impulse_pct < config.min_impulse_pct {
        return Err(MarginRejection::ImpulseTooSmall);
    }
    if snapshot.range_pct < snapshot.impulse_pct * config.range_to_impulse {
        return Err(MarginRejection::RangeTooNarrow);
    }
    if snapshot.volatility <= 0.0 {
        return Err(MarginRejection::NoVolatility);
    }
    Ok(())
}
