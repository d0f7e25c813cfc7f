pub mod bybit;
pub mod core;
pub mod gate;
pub mod mock;
pub mod notifier;
pub mod persistence;
pub mod precision;
pub mod repositories;
pub mod synthetic;

pub use bybit::BybitCandleSource;
pub use gate::{LiquidityRangeConfig, LiquidityRangeGate};
pub use notifier::TracingNotifier;
pub use precision::StaticPrecisionTable;
pub use repositories::{InMemorySignalRepository, InMemoryZoneRepository};
pub use synthetic::{FallbackCandleSource, SyntheticCandleSource};
