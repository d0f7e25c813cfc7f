// One worker per (symbol, timeframe)
pub mod agents;
pub mod bootstrap;

// Signal pipeline: MTF context and the fail-fast cycle
pub mod pipeline;

// System orchestrator
pub mod system;
