use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mtf_context::MtfContextBuilder;
use crate::domain::errors::LevelError;
use crate::domain::market::candle::{CandleBatch, SeriesKey};
use crate::domain::ports::{CandleSource, FinalCandleSelector, PricePrecision, StructureGate};
use crate::domain::signals::levels::{LevelConfig, calculate_levels};
use crate::domain::signals::margin::{MarginConfig, MarginRejection, check_margin};
use crate::domain::signals::scoring::{ScoringConfig, run_scoring};
use crate::domain::signals::snapshot::{SnapshotConfig, build_stf_snapshot};
use crate::domain::signals::types::SignalContract;

/// Thresholds of every pipeline stage
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub snapshot: SnapshotConfig,
    pub margin: MarginConfig,
    pub scoring: ScoringConfig,
    pub levels: LevelConfig,
}

/// Stage at which a cycle stopped without producing a contract
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    SnapshotUnavailable,
    InsufficientHistory { available: usize, needed: usize },
    MarginRejected(MarginRejection),
    GateUnavailable,
    GateRejected,
    ScoreRejected,
    LevelsUnavailable(LevelError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::SnapshotUnavailable => write!(f, "snapshot unavailable"),
            SkipReason::InsufficientHistory { available, needed } => {
                write!(f, "insufficient history ({}/{})", available, needed)
            }
            SkipReason::MarginRejected(reason) => write!(f, "margin rejected: {}", reason),
            SkipReason::GateUnavailable => write!(f, "gate unavailable"),
            SkipReason::GateRejected => write!(f, "gate rejected"),
            SkipReason::ScoreRejected => write!(f, "score rejected"),
            SkipReason::LevelsUnavailable(e) => write!(f, "levels unavailable: {}", e),
        }
    }
}

/// Result of one pipeline cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Signal(SignalContract),
    Skipped(SkipReason),
}

impl CycleOutcome {
    pub fn is_signal(&self) -> bool {
        matches!(self, CycleOutcome::Signal(_))
    }

    pub fn signal(&self) -> Option<&SignalContract> {
        match self {
            CycleOutcome::Signal(signal) => Some(signal),
            CycleOutcome::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            CycleOutcome::Signal(_) => None,
            CycleOutcome::Skipped(reason) => Some(reason),
        }
    }
}

/// Runs the fail-fast signal pipeline for one (symbol, timeframe):
/// snapshot, margin, gate, MTF context, scoring, levels, contract.
///
/// Every stage either passes or stops the cycle with a `SkipReason`; nothing
/// here is an error.
pub struct CycleOrchestrator {
    source: Arc<dyn CandleSource>,
    gate: Arc<dyn StructureGate>,
    mtf: MtfContextBuilder,
    selector: Arc<dyn FinalCandleSelector>,
    precision: Arc<dyn PricePrecision>,
    config: PipelineConfig,
}

impl CycleOrchestrator {
    pub fn new(
        source: Arc<dyn CandleSource>,
        gate: Arc<dyn StructureGate>,
        mtf: MtfContextBuilder,
        selector: Arc<dyn FinalCandleSelector>,
        precision: Arc<dyn PricePrecision>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            gate,
            mtf,
            selector,
            precision,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Candles requested per cycle on the signal timeframe
    pub fn fetch_limit(&self) -> usize {
        self.config.snapshot.fetch_limit
    }

    /// Fetches the signal-timeframe window and evaluates it
    pub async fn run_cycle(&self, key: &SeriesKey) -> CycleOutcome {
        match self
            .source
            .fetch(&key.symbol, key.timeframe, self.fetch_limit())
            .await
        {
            Ok(batch) => self.evaluate(key, &batch).await,
            Err(e) => {
                warn!("Pipeline [{}]: candle fetch failed: {}", key, e);
                CycleOutcome::Skipped(SkipReason::SnapshotUnavailable)
            }
        }
    }

    /// Evaluates an already fetched window
    pub async fn evaluate(&self, key: &SeriesKey, batch: &CandleBatch) -> CycleOutcome {
        let outcome = self.evaluate_stages(key, batch).await;
        match &outcome {
            CycleOutcome::Signal(signal) => info!(
                "Pipeline [{}]: {} signal score={} confidence={} base={} ({})",
                key,
                signal.direction,
                signal.score,
                signal.confidence,
                signal.base_candle_id,
                signal.data_health
            ),
            CycleOutcome::Skipped(reason) => debug!("Pipeline [{}]: skipped, {}", key, reason),
        }
        outcome
    }

    async fn evaluate_stages(&self, key: &SeriesKey, batch: &CandleBatch) -> CycleOutcome {
        // 1. STF snapshot
        let needed = self.config.snapshot.window;
        if batch.len() < needed {
            return CycleOutcome::Skipped(SkipReason::InsufficientHistory {
                available: batch.len(),
                needed,
            });
        }
        let Some(snapshot) = build_stf_snapshot(batch, &self.config.snapshot) else {
            return CycleOutcome::Skipped(SkipReason::SnapshotUnavailable);
        };

        // 2. Margin requirement
        if let Err(rejection) = check_margin(&snapshot, &self.config.margin) {
            return CycleOutcome::Skipped(SkipReason::MarginRejected(rejection));
        }

        // 3. Structure gate
        let gate = match self.gate.check(&key.symbol).await {
            Ok(gate) => gate,
            Err(e) => {
                warn!("Pipeline [{}]: structure gate unavailable: {}", key, e);
                return CycleOutcome::Skipped(SkipReason::GateUnavailable);
            }
        };
        if !gate.pass {
            return CycleOutcome::Skipped(SkipReason::GateRejected);
        }

        // 4. MTF context, never blocks
        let mtf = self.mtf.build(&key.symbol).await;

        // 5. Scoring
        let score = run_scoring(&snapshot, &gate, &mtf, &self.config.scoring);
        let Some(direction) = score.direction.filter(|_| score.pass) else {
            return CycleOutcome::Skipped(SkipReason::ScoreRejected);
        };

        // 6. Levels
        let precision = self.precision.precision(&key.symbol);
        let levels = match calculate_levels(
            &snapshot.candles,
            direction,
            self.selector.as_ref(),
            precision,
            &self.config.levels,
        ) {
            Ok(levels) => levels,
            Err(e) => return CycleOutcome::Skipped(SkipReason::LevelsUnavailable(e)),
        };

        // 7. Contract
        CycleOutcome::Signal(SignalContract {
            symbol: key.symbol.clone(),
            timeframe: key.timeframe.to_string(),
            direction,
            score: score.score,
            confidence: score.confidence,
            mtf_bias: mtf.bias,
            gate_context: gate,
            margin_pass: true,
            levels: levels.levels,
            base_candle_id: levels.base_candle_id,
            data_health: snapshot.health,
            timestamp: Utc::now(),
        })
    }
}
