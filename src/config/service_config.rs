//! Service layout configuration parsing from environment variables.
//!
//! Which series are watched, how often they are polled, where state is stored
//! and how prices are rounded.

use super::EnvReader;
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result, ensure};
use std::collections::HashMap;
use std::time::Duration;

/// Service environment configuration
#[derive(Debug, Clone)]
pub struct ServiceEnvConfig {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    pub mtf_timeframes: Vec<Timeframe>,
    /// Poll interval of timeframes up to 15 minutes
    pub poll_sec_fast: u64,
    pub poll_sec_slow: u64,
    pub database_url: String,
    pub price_decimals: HashMap<String, u32>,
    pub default_price_decimals: u32,
}

impl Default for ServiceEnvConfig {
    fn default() -> Self {
        Self {
            symbols: ["GRTUSDT", "ADAUSDT", "INJUSDT", "LINKUSDT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeframes: vec![
                Timeframe::FiveMin,
                Timeframe::FifteenMin,
                Timeframe::OneHour,
                Timeframe::FourHour,
            ],
            mtf_timeframes: vec![Timeframe::OneHour, Timeframe::FourHour],
            poll_sec_fast: 60,
            poll_sec_slow: 180,
            database_url: "sqlite://marginzone.db".to_string(),
            price_decimals: [("GRTUSDT", 5), ("ADAUSDT", 4), ("INJUSDT", 3), ("LINKUSDT", 3)]
                .iter()
                .map(|(s, dp)| (s.to_string(), *dp))
                .collect(),
            default_price_decimals: 2,
        }
    }
}

impl ServiceEnvConfig {
    pub(crate) fn load(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();

        let symbols: Vec<String> = env
            .list("SYMBOLS", &defaults.symbols.join(","))
            .into_iter()
            .map(|s| s.to_uppercase())
            .collect();
        ensure!(!symbols.is_empty(), "SYMBOLS must name at least one symbol");

        let timeframes = env.timeframes("TF_LIST", "5,15,60,240")?;
        ensure!(!timeframes.is_empty(), "TF_LIST must name at least one timeframe");

        let poll_sec_fast = env.parse_u64("POLL_SEC_FAST", defaults.poll_sec_fast)?;
        let poll_sec_slow = env.parse_u64("POLL_SEC_SLOW", defaults.poll_sec_slow)?;
        ensure!(
            poll_sec_fast > 0 && poll_sec_slow > 0,
            "POLL_SEC_FAST and POLL_SEC_SLOW must be positive"
        );

        // PRICE_DECIMALS entries override the built-in table
        let mut price_decimals = defaults.price_decimals.clone();
        price_decimals.extend(parse_price_decimals(&env.string("PRICE_DECIMALS", ""))?);

        Ok(Self {
            symbols,
            timeframes,
            mtf_timeframes: env.timeframes("MTF_TF_LIST", "60,240")?,
            poll_sec_fast,
            poll_sec_slow,
            database_url: env.string("DATABASE_URL", &defaults.database_url),
            price_decimals,
            default_price_decimals: env.parse("PRICE_DECIMALS_DEFAULT", defaults.default_price_decimals)?,
        })
    }

    pub fn poll_interval(&self, timeframe: Timeframe) -> Duration {
        if timeframe.is_fast() {
            Duration::from_secs(self.poll_sec_fast)
        } else {
            Duration::from_secs(self.poll_sec_slow)
        }
    }
}

/// Parses `SYM:dp,SYM:dp`
fn parse_price_decimals(raw: &str) -> Result<HashMap<String, u32>> {
    let mut table = HashMap::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (symbol, decimals) = entry
            .split_once(':')
            .with_context(|| format!("PRICE_DECIMALS entry '{}' is not SYMBOL:DECIMALS", entry))?;
        let decimals = decimals
            .trim()
            .parse::<u32>()
            .with_context(|| format!("Failed to parse PRICE_DECIMALS for {}", symbol.trim()))?;
        table.insert(symbol.trim().to_uppercase(), decimals);
    }
    Ok(table)
}
