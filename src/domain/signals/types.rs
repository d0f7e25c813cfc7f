use crate::domain::market::candle::{Candle, DataHealth};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade direction resolved by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// Directional lean of a context (gate or higher timeframes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bias {
    Long,
    Short,
    Neutral,
}

impl Bias {
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Bias::Long => Some(Direction::Long),
            Bias::Short => Some(Direction::Short),
            Bias::Neutral => None,
        }
    }
}

impl From<Direction> for Bias {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Long => Bias::Long,
            Direction::Short => Bias::Short,
        }
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bias::Long => write!(f, "LONG"),
            Bias::Short => write!(f, "SHORT"),
            Bias::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Where price sits relative to the structural range reported by the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GatePosition {
    Inside,
    Edge,
    Other,
}

impl fmt::Display for GatePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatePosition::Inside => write!(f, "INSIDE"),
            GatePosition::Edge => write!(f, "EDGE"),
            GatePosition::Other => write!(f, "OTHER"),
        }
    }
}

/// Output of the market-structure gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateContext {
    pub pass: bool,
    pub position: GatePosition,
    pub bias: Bias,
}

impl GateContext {
    pub fn closed() -> Self {
        Self {
            pass: false,
            position: GatePosition::Other,
            bias: Bias::Neutral,
        }
    }
}

/// Summary of the signal timeframe for one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StfSnapshot {
    pub candle_count: usize,
    /// Largest single-candle range relative to its open
    pub impulse_pct: f64,
    /// Window range relative to the last close
    pub range_pct: f64,
    /// ATR relative to the last close
    pub volatility: f64,
    /// Window the snapshot was computed from, newest last
    #[serde(skip)]
    pub candles: Vec<Candle>,
    pub health: DataHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Impulsive,
    Corrective,
    Flat,
}

impl TrendState {
    pub fn from_strength(strength: u8) -> Self {
        if strength >= 65 {
            TrendState::Impulsive
        } else if strength >= 35 {
            TrendState::Corrective
        } else {
            TrendState::Flat
        }
    }
}

/// Directional context merged across higher timeframes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MtfContext {
    pub bias: Bias,
    /// 0..=100
    pub strength: u8,
    pub trend_state: TrendState,
}

impl MtfContext {
    pub fn neutral() -> Self {
        Self {
            bias: Bias::Neutral,
            strength: 0,
            trend_state: TrendState::Flat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Mid,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Low => write!(f, "LOW"),
            Confidence::Mid => write!(f, "MID"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

/// Outcome of the scoring stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub pass: bool,
    pub score: i32,
    pub direction: Option<Direction>,
    pub confidence: Confidence,
}

impl ScoreResult {
    /// Canonical result of a failed scoring run
    pub fn fail() -> Self {
        Self {
            pass: false,
            score: 0,
            direction: None,
            confidence: Confidence::Low,
        }
    }
}

/// ACDFXY levels plus targets and stop, rounded to the instrument precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct LevelSet {
    pub A: Decimal,
    pub C: Decimal,
    pub D: Decimal,
    pub F: Decimal,
    pub X: Decimal,
    pub Y: Decimal,
    pub TP1: Decimal,
    pub TP2: Decimal,
    pub TP3: Decimal,
    pub SL: Decimal,
}

/// Levels together with the candle they were derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResult {
    pub base_candle_id: i64,
    pub levels: LevelSet,
}

/// The only output of a successful pipeline cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalContract {
    pub symbol: String,
    pub timeframe: String,
    pub direction: Direction,
    pub score: i32,
    pub confidence: Confidence,
    pub mtf_bias: Bias,
    pub gate_context: GateContext,
    pub margin_pass: bool,
    pub levels: LevelSet,
    pub base_candle_id: i64,
    pub data_health: DataHealth,
    pub timestamp: DateTime<Utc>,
}
