// Market data domain (candles, timeframes, volatility)
pub mod market;

// Margin zone lifecycle
pub mod zones;

// Gated signal pipeline stages
pub mod signals;

// Port interfaces
pub mod ports;

// Repository traits
pub mod repositories;

// Domain-specific error types
pub mod errors;
