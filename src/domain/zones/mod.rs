// Margin zone lifecycle: zone model, per-series engine, registry of engines
pub mod engine;
pub mod registry;
pub mod zone;

pub use engine::{ZoneEngine, ZoneSnapshot};
pub use registry::ZoneRegistry;
pub use zone::{Zone, ZoneConfig, ZoneEvent, ZoneState};
