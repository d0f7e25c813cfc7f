//! Configuration module for the margin zone service.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: candle Source, Engine thresholds and Service layout.

mod engine_config;
mod service_config;
mod source_config;

pub use engine_config::EngineEnvConfig;
pub use service_config::ServiceEnvConfig;
pub use source_config::SourceEnvConfig;

use crate::domain::market::candle::SeriesKey;
use crate::domain::market::timeframe::Timeframe;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Key/value lookup the sub-configs read from.
///
/// `from_env` backs it with the process environment; tests pass a map.
pub(crate) struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvReader<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    /// Value of `key`, with blank values treated as unset
    pub(crate) fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(raw) => raw
                .parse::<T>()
                .context(format!("Failed to parse {}", key)),
            None => Ok(default),
        }
    }

    pub(crate) fn parse_usize(&self, key: &str, default: usize) -> Result<usize> {
        self.parse(key, default)
    }

    pub(crate) fn parse_u64(&self, key: &str, default: u64) -> Result<u64> {
        self.parse(key, default)
    }

    pub(crate) fn parse_f64(&self, key: &str, default: f64) -> Result<f64> {
        self.parse(key, default)
    }

    pub(crate) fn parse_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(raw) => match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => default,
            },
            None => default,
        }
    }

    /// Comma separated list, entries trimmed, empty entries dropped
    pub(crate) fn list(&self, key: &str, default: &str) -> Vec<String> {
        self.string(key, default)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub(crate) fn timeframes(&self, key: &str, default: &str) -> Result<Vec<Timeframe>> {
        self.list(key, default)
            .iter()
            .map(|raw| {
                Timeframe::from_str(raw).map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", key, e))
            })
            .collect()
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceEnvConfig,
    pub engine: EngineEnvConfig,
    pub service: ServiceEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let lookup = |key: &str| env::var(key).ok();
        Self::from_lookup(&lookup)
    }

    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader::new(lookup);

        let source = SourceEnvConfig::load(&reader).context("Failed to load source config")?;
        let engine = EngineEnvConfig::load(&reader).context("Failed to load engine config")?;
        let service = ServiceEnvConfig::load(&reader).context("Failed to load service config")?;

        Ok(Self {
            source,
            engine,
            service,
        })
    }

    /// Every configured (symbol, timeframe) pair
    pub fn keys(&self) -> Vec<SeriesKey> {
        self.service
            .symbols
            .iter()
            .flat_map(|symbol| {
                self.service
                    .timeframes
                    .iter()
                    .map(move |&tf| SeriesKey::new(symbol.clone(), tf))
            })
            .collect()
    }

    pub fn poll_interval(&self, timeframe: Timeframe) -> Duration {
        self.service.poll_interval(timeframe)
    }
}
