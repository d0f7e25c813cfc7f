use super::timeframe::Timeframe;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One OHLC bar. Prices are non-negative, timestamp is epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    #[serde(default)]
    pub volume: Decimal,
}

impl Candle {
    pub fn new(timestamp: i64, open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: Decimal::ZERO,
        }
    }

    /// Identifier used to trace levels back to the candle they were built from
    pub fn id(&self) -> i64 {
        self.timestamp
    }

    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    pub fn body(&self) -> Decimal {
        (self.close - self.open).abs()
    }

    pub fn midpoint(&self) -> Decimal {
        (self.high + self.low) / Decimal::TWO
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// A bar is usable when prices are non-negative and the high/low envelope
    /// contains open and close.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| !p.is_sign_negative())
            && self.high >= self.low
            && self.open <= self.high
            && self.open >= self.low
            && self.close <= self.high
            && self.close >= self.low
    }
}

/// Drops invalid bars and any bar that does not advance the timestamp.
pub fn sanitize_series(candles: Vec<Candle>) -> Vec<Candle> {
    let mut out: Vec<Candle> = Vec::with_capacity(candles.len());
    for candle in candles {
        if !candle.is_valid() {
            continue;
        }
        if let Some(last) = out.last()
            && candle.timestamp <= last.timestamp
        {
            continue;
        }
        out.push(candle);
    }
    out
}

/// The (symbol, timeframe) pair that owns one zone engine and one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub symbol: String,
    pub timeframe: Timeframe,
}

impl SeriesKey {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.symbol, self.timeframe)
    }
}

/// Whether a batch came from the exchange or from the offline generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataHealth {
    Live,
    Synthetic,
}

impl DataHealth {
    /// Combining batches keeps the worst health seen
    pub fn merge(self, other: DataHealth) -> DataHealth {
        match (self, other) {
            (DataHealth::Live, DataHealth::Live) => DataHealth::Live,
            _ => DataHealth::Synthetic,
        }
    }
}

impl fmt::Display for DataHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataHealth::Live => write!(f, "LIVE"),
            DataHealth::Synthetic => write!(f, "SYNTHETIC"),
        }
    }
}

/// Ordered candles (newest last) plus the health of the source that produced them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleBatch {
    pub candles: Vec<Candle>,
    pub health: DataHealth,
}

impl CandleBatch {
    pub fn live(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            health: DataHealth::Live,
        }
    }

    pub fn synthetic(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            health: DataHealth::Synthetic,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}
