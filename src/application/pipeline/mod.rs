pub mod mtf_context;
pub mod orchestrator;

pub use mtf_context::MtfContextBuilder;
pub use orchestrator::{CycleOrchestrator, CycleOutcome, PipelineConfig, SkipReason};
