use crate::domain::market::candle::{Candle, SeriesKey};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a margin zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneState {
    /// No active zone, waiting for an impulse candle
    Wait,
    Created,
    Entered,
    FalseBreak,
    Hold,
    ExitImpulse,
    Expired,
}

impl ZoneState {
    /// Terminal states destroy the zone and return the engine to `Wait`
    pub fn is_terminal(&self) -> bool {
        matches!(self, ZoneState::ExitImpulse | ZoneState::Expired)
    }

    /// States in which inside-bars and false breaks are tracked
    pub fn is_accumulating(&self) -> bool {
        matches!(
            self,
            ZoneState::Entered | ZoneState::FalseBreak | ZoneState::Hold
        )
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneState::Wait => write!(f, "WAIT"),
            ZoneState::Created => write!(f, "CREATED"),
            ZoneState::Entered => write!(f, "ENTERED"),
            ZoneState::FalseBreak => write!(f, "FALSE_BREAK"),
            ZoneState::Hold => write!(f, "HOLD"),
            ZoneState::ExitImpulse => write!(f, "EXIT_IMPULSE"),
            ZoneState::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Tuning knobs of the zone state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub atr_period: usize,
    /// Candle range must reach `ATR * impulse_atr_mult` to seed a zone
    pub impulse_atr_mult: Decimal,
    /// Half-width of a new zone in ATR units
    pub zone_width_atr: Decimal,
    /// Consecutive inside closes needed for `Hold`
    pub hold_bars: u32,
    /// Body must reach `avg_body * impulse_exit_body_mult` for an impulsive exit
    pub impulse_exit_body_mult: Decimal,
    pub avg_body_lookback: usize,
    /// Bars a zone may live before it expires
    pub max_zone_lifetime: u64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            impulse_atr_mult: dec!(1.8),
            zone_width_atr: dec!(0.5),
            hold_bars: 5,
            impulse_exit_body_mult: dec!(1.5),
            avg_body_lookback: 20,
            max_zone_lifetime: 80,
        }
    }
}

impl ZoneConfig {
    /// Bars needed before both ATR and the body average are available
    pub fn min_history(&self) -> usize {
        (self.atr_period + 1).max(self.avg_body_lookback)
    }
}

/// A price band anchored on the midpoint of an impulse candle.
///
/// `upper - lower` is fixed at creation; a zone is replaced, never resized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub symbol: String,
    pub timeframe: String,
    pub center: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
    /// Timestamp of the impulse candle
    pub created_at: i64,
    /// Engine bar index of the impulse candle
    pub created_bar: u64,
    pub state: ZoneState,
    pub false_break_count: u32,
    pub inside_bars: u32,
}

impl Zone {
    /// Builds a zone around an impulse candle. Returns `None` when the ATR is not
    /// positive (a zero-width zone would break `lower < center < upper`).
    pub fn from_impulse(
        key: &SeriesKey,
        candle: &Candle,
        atr: Decimal,
        zone_width_atr: Decimal,
        bar_index: u64,
    ) -> Option<Self> {
        let half_width = atr * zone_width_atr;
        if half_width <= Decimal::ZERO {
            return None;
        }
        let center = candle.midpoint();

        Some(Self {
            id: format!("{}_{}_{}", key.symbol, key.timeframe, candle.timestamp),
            symbol: key.symbol.clone(),
            timeframe: key.timeframe.to_string(),
            center,
            upper: center + half_width,
            lower: center - half_width,
            created_at: candle.timestamp,
            created_bar: bar_index,
            state: ZoneState::Created,
            false_break_count: 0,
            inside_bars: 0,
        })
    }

    pub fn width(&self) -> Decimal {
        self.upper - self.lower
    }

    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.lower && price <= self.upper
    }

    /// Wick pierced a boundary but the close stayed on the zone side of it
    pub fn is_false_break(&self, candle: &Candle) -> bool {
        let false_up = candle.high > self.upper && candle.close < self.upper;
        let false_down = candle.low < self.lower && candle.close > self.lower;
        false_up || false_down
    }

    /// Close beyond either boundary
    pub fn is_closed_outside(&self, candle: &Candle) -> bool {
        candle.close > self.upper || candle.close < self.lower
    }
}

/// Emitted on every zone transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEvent {
    pub key: SeriesKey,
    pub state: ZoneState,
    /// Zone as it stands after the transition
    pub zone: Zone,
    pub bar_timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::timeframe::Timeframe;

    fn key() -> SeriesKey {
        SeriesKey::new("BTCUSDT", Timeframe::FiveMin)
    }

    #[test]
    fn test_zone_from_impulse_candle() {
        let candle = Candle::new(1_700_000_000_000, dec!(1000), dec!(1250), dec!(990), dec!(1200));
        let zone = Zone::from_impulse(&key(), &candle, dec!(100), dec!(0.5), 42).unwrap();

        assert_eq!(zone.center, dec!(1120));
        assert_eq!(zone.upper, dec!(1170));
        assert_eq!(zone.lower, dec!(1070));
        assert_eq!(zone.width(), dec!(100));
        assert_eq!(zone.state, ZoneState::Created);
        assert_eq!(zone.created_bar, 42);
        assert_eq!(zone.id, "BTCUSDT_5_1700000000000");
    }

    #[test]
    fn test_zone_requires_positive_width() {
        let candle = Candle::new(1, dec!(10), dec!(10), dec!(10), dec!(10));
        assert!(Zone::from_impulse(&key(), &candle, Decimal::ZERO, dec!(0.5), 0).is_none());
    }

    #[test]
    fn test_false_break_detection() {
        let candle = Candle::new(1, dec!(1000), dec!(1250), dec!(990), dec!(1200));
        let zone = Zone::from_impulse(&key(), &candle, dec!(100), dec!(0.5), 0).unwrap();

        let wick_up = Candle::new(2, dec!(1100), dec!(1180), dec!(1095), dec!(1160));
        assert!(zone.is_false_break(&wick_up));

        let wick_down = Candle::new(3, dec!(1100), dec!(1110), dec!(1060), dec!(1080));
        assert!(zone.is_false_break(&wick_down));

        let breakout = Candle::new(4, dec!(1150), dec!(1200), dec!(1140), dec!(1190));
        assert!(!zone.is_false_break(&breakout));
        assert!(zone.is_closed_outside(&breakout));

        let inside = Candle::new(5, dec!(1100), dec!(1150), dec!(1090), dec!(1120));
        assert!(!zone.is_false_break(&inside));
        assert!(zone.contains(inside.close));
    }

    #[test]
    fn test_terminal_states() {
        assert!(ZoneState::ExitImpulse.is_terminal());
        assert!(ZoneState::Expired.is_terminal());
        assert!(!ZoneState::FalseBreak.is_terminal());
        assert!(!ZoneState::Hold.is_terminal());
        assert_eq!(ZoneState::FalseBreak.to_string(), "FALSE_BREAK");
    }
}
