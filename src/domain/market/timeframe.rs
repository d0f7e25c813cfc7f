use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle intervals the signal service knows how to fetch and schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    OneMin,
    FiveMin,
    FifteenMin,
    OneHour,
    FourHour,
    OneDay,
}

impl Timeframe {
    /// Returns the duration of this timeframe in minutes
    pub fn to_minutes(&self) -> usize {
        match self {
            Timeframe::OneMin => 1,
            Timeframe::FiveMin => 5,
            Timeframe::FifteenMin => 15,
            Timeframe::OneHour => 60,
            Timeframe::FourHour => 240,
            Timeframe::OneDay => 1440,
        }
    }

    /// Returns the duration in milliseconds
    pub fn to_millis(&self) -> i64 {
        (self.to_minutes() * 60_000) as i64
    }

    /// Converts to Bybit v5 kline interval string
    pub fn to_bybit_string(&self) -> &'static str {
        match self {
            Timeframe::OneMin => "1",
            Timeframe::FiveMin => "5",
            Timeframe::FifteenMin => "15",
            Timeframe::OneHour => "60",
            Timeframe::FourHour => "240",
            Timeframe::OneDay => "D",
        }
    }

    /// Fast timeframes are polled more often than slow ones
    pub fn is_fast(&self) -> bool {
        self.to_minutes() <= 15
    }

    /// Returns all available timeframes in ascending order
    pub fn all() -> Vec<Timeframe> {
        vec![
            Timeframe::OneMin,
            Timeframe::FiveMin,
            Timeframe::FifteenMin,
            Timeframe::OneHour,
            Timeframe::FourHour,
            Timeframe::OneDay,
        ]
    }

    /// Returns the start timestamp (ms) of the period containing the given timestamp
    pub fn period_start(&self, timestamp_ms: i64) -> i64 {
        timestamp_ms - timestamp_ms.rem_euclid(self.to_millis())
    }
}

impl FromStr for Timeframe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1m" | "1min" => Ok(Timeframe::OneMin),
            "5" | "5m" | "5min" => Ok(Timeframe::FiveMin),
            "15" | "15m" | "15min" => Ok(Timeframe::FifteenMin),
            "60" | "1h" | "1hour" => Ok(Timeframe::OneHour),
            "240" | "4h" | "4hour" => Ok(Timeframe::FourHour),
            "d" | "1d" | "1day" => Ok(Timeframe::OneDay),
            _ => Err(anyhow!(
                "Invalid timeframe: '{}'. Valid options: 1, 5, 15, 60, 240, D (or 5m, 1h, 4h, ...)",
                s
            )),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_bybit_string())
    }
}
