// Gated signal pipeline: pure stages from snapshot to levels
pub mod final_candle;
pub mod levels;
pub mod margin;
pub mod mtf;
pub mod scoring;
pub mod snapshot;
pub mod types;

pub use final_candle::MaxImpulseSelector;
pub use levels::{LevelConfig, calculate_levels};
pub use margin::{MarginConfig, MarginRejection, check_margin};
pub use scoring::{ScoringConfig, run_scoring};
pub use snapshot::{SnapshotConfig, build_stf_snapshot};
pub use types::{
    Bias, Confidence, Direction, GateContext, GatePosition, LevelResult, LevelSet, MtfContext,
    ScoreResult, SignalContract, StfSnapshot, TrendState,
};
