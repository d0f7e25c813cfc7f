//! Candle source configuration parsing from environment variables.
//!
//! This module handles the Bybit endpoint and the synthetic fallback switches.

use super::EnvReader;
use anyhow::Result;

/// Candle source environment configuration
#[derive(Debug, Clone)]
pub struct SourceEnvConfig {
    pub bybit_base_url: String,
    /// Skip the exchange entirely and serve synthetic candles
    pub offline: bool,
    pub synthetic_seed: u64,
    pub http_max_retries: u32,
}

impl Default for SourceEnvConfig {
    fn default() -> Self {
        Self {
            bybit_base_url: "https://api.bybit.com".to_string(),
            offline: false,
            synthetic_seed: 42,
            http_max_retries: 3,
        }
    }
}

impl SourceEnvConfig {
    pub(crate) fn load(env: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            bybit_base_url: env
                .string("BYBIT_BASE_URL", &defaults.bybit_base_url)
                .trim_end_matches('/')
                .to_string(),
            offline: env.parse_bool("OFFLINE", defaults.offline),
            synthetic_seed: env.parse_u64("SYNTHETIC_SEED", defaults.synthetic_seed)?,
            http_max_retries: env.parse("HTTP_MAX_RETRIES", defaults.http_max_retries)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_overrides() {
        let lookup = |key: &str| match key {
            "BYBIT_BASE_URL" => Some("https://api-testnet.bybit.com/".to_string()),
            "SYNTHETIC_SEED" => Some("7".to_string()),
            _ => None,
        };
        let config = SourceEnvConfig::load(&EnvReader::new(&lookup)).unwrap();
        assert_eq!(config.bybit_base_url, "https://api-testnet.bybit.com");
        assert_eq!(config.synthetic_seed, 7);
        assert_eq!(config.http_max_retries, 3);
    }
}
