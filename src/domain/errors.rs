use thiserror::Error;

/// Errors raised while deriving ACDFXY levels from a candle window
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("Insufficient history: need {needed} candles, got {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("No final candle could be selected")]
    NoFinalCandle,

    #[error("Final candle {candle_id} has no impulse in the trade direction")]
    ZeroImpulse { candle_id: i64 },

    #[error("Levels of candle {candle_id} collapse at {precision} decimals")]
    CollapsedLevels { candle_id: i64, precision: u32 },
}

/// Errors related to market data and connectivity
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Invalid market data for {symbol}: {reason}")]
    InvalidData { symbol: String, reason: String },

    #[error("Exchange returned error {code} for {symbol}: {message}")]
    ExchangeError {
        symbol: String,
        code: i64,
        message: String,
    },

    #[error("Circuit breaker open for {service}")]
    CircuitOpen { service: String },
}

/// Errors raised by the market-structure gate
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Not enough gate candles for {symbol}: need {needed}, got {available}")]
    InsufficientData {
        symbol: String,
        needed: usize,
        available: usize,
    },

    #[error("Gate data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_error_formatting() {
        let error = LevelError::InsufficientHistory {
            needed: 180,
            available: 42,
        };

        let msg = error.to_string();
        assert!(msg.contains("180"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_market_data_error_formatting() {
        let error = MarketDataError::ExchangeError {
            symbol: "GRTUSDT".to_string(),
            code: 10001,
            message: "params error".to_string(),
        };

        let msg = error.to_string();
        assert!(msg.contains("GRTUSDT"));
        assert!(msg.contains("10001"));
    }
}
