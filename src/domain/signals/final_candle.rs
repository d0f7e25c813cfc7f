use super::types::Direction;
use crate::domain::market::candle::Candle;
use crate::domain::ports::FinalCandleSelector;
use rust_decimal::Decimal;

/// Picks the candle with the largest move in the trade direction:
/// `high - open` for longs, `open - low` for shorts.
#[derive(Debug, Clone, Copy)]
pub struct MaxImpulseSelector {
    pub min_window: usize,
}

impl Default for MaxImpulseSelector {
    fn default() -> Self {
        Self { min_window: 180 }
    }
}

impl MaxImpulseSelector {
    pub fn new(min_window: usize) -> Self {
        Self { min_window }
    }

    pub fn directional_impulse(candle: &Candle, direction: Direction) -> Decimal {
        match direction {
            Direction::Long => candle.high - candle.open,
            Direction::Short => candle.open - candle.low,
        }
    }
}

impl FinalCandleSelector for MaxImpulseSelector {
    fn pick(&self, candles: &[Candle], direction: Direction) -> Option<Candle> {
        if candles.len() < self.min_window {
            return None;
        }

        let mut best: Option<(&Candle, Decimal)> = None;
        for candle in candles {
            let impulse = Self::directional_impulse(candle, direction);
            // strict comparison keeps the earliest candle on ties
            match best {
                Some((_, top)) if impulse <= top => {}
                _ => best = Some((candle, impulse)),
            }
        }
        best.map(|(candle, _)| candle.clone())
    }
}
