use super::types::{Direction, LevelResult, LevelSet};
use crate::domain::errors::LevelError;
use crate::domain::market::candle::Candle;
use crate::domain::ports::FinalCandleSelector;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Fractions of `delta` used for targets and stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub min_window: usize,
    /// TP1 offset from A
    pub target_fraction: Decimal,
    /// X and Y offsets beyond D and F
    pub extension_fraction: Decimal,
    /// SL offset beyond C
    pub stop_fraction: Decimal,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            min_window: 180,
            target_fraction: dec!(0.5),
            extension_fraction: dec!(0.5),
            stop_fraction: dec!(0.25),
        }
    }
}

/// Derives the ACDFXY level set from the final candle of `candles`.
///
/// Pure function of its inputs: the same window, direction and precision always
/// yield the same levels.
pub fn calculate_levels(
    candles: &[Candle],
    direction: Direction,
    selector: &dyn FinalCandleSelector,
    precision: u32,
    config: &LevelConfig,
) -> Result<LevelResult, LevelError> {
    if candles.len() < config.min_window {
        return Err(LevelError::InsufficientHistory {
            needed: config.min_window,
            available: candles.len(),
        });
    }

    let base = selector
        .pick(candles, direction)
        .ok_or(LevelError::NoFinalCandle)?;

    let levels = levels_from_candle(&base, direction, precision, config)?;
    Ok(LevelResult {
        base_candle_id: base.id(),
        levels,
    })
}

/// Level geometry for one base candle
pub fn levels_from_candle(
    base: &Candle,
    direction: Direction,
    precision: u32,
    config: &LevelConfig,
) -> Result<LevelSet, LevelError> {
    let (base_low, base_high) = match direction {
        Direction::Long => (base.open, base.high),
        Direction::Short => (base.low, base.open),
    };

    if base_high - base_low <= Decimal::ZERO {
        return Err(LevelError::ZeroImpulse {
            candle_id: base.id(),
        });
    }

    let a = base_high;
    let c = base_low;
    let delta = (a - c).abs();
    // +1 long, -1 short: every offset points with or against the trade
    let sign = direction.sign();

    let (d, f, tp1, sl) = match direction {
        Direction::Long => (
            a + delta,
            c - delta,
            a + delta * config.target_fraction,
            c - delta * config.stop_fraction,
        ),
        Direction::Short => (
            c - delta,
            a + delta,
            a - delta * config.target_fraction,
            c + delta * config.stop_fraction,
        ),
    };
    let x = d + sign * delta * config.extension_fraction;
    let y = f - sign * delta * config.extension_fraction;

    let round = |value: Decimal| value.round_dp(precision);
    let levels = LevelSet {
        A: round(a),
        C: round(c),
        D: round(d),
        F: round(f),
        X: round(x),
        Y: round(y),
        TP1: round(tp1),
        TP2: round(d),
        TP3: round(x),
        SL: round(sl),
    };

    if !is_well_ordered(&levels, direction) {
        return Err(LevelError::CollapsedLevels {
            candle_id: base.id(),
            precision,
        });
    }
    Ok(levels)
}

/// Rounding must keep `C < A`, the stop strictly beyond C against the trade and
/// the targets strictly ordered with it.
fn is_well_ordered(levels: &LevelSet, direction: Direction) -> bool {
    if levels.C >= levels.A {
        return false;
    }
    match direction {
        Direction::Long => {
            levels.SL < levels.C && levels.TP1 < levels.TP2 && levels.TP2 < levels.TP3
        }
        Direction::Short => {
            levels.SL > levels.C && levels.TP1 > levels.TP2 && levels.TP2 > levels.TP3
        }
    }
}
