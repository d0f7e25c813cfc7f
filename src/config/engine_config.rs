//! Engine configuration parsing from environment variables.
//!
//! Zone state machine, pipeline thresholds and the structure gate. Every value
//! defaults to the tuned constants, so an empty environment is a valid setup.

use super::EnvReader;
use crate::application::pipeline::PipelineConfig;
use crate::domain::signals::levels::LevelConfig;
use crate::domain::signals::margin::MarginConfig;
use crate::domain::signals::scoring::ScoringConfig;
use crate::domain::signals::snapshot::SnapshotConfig;
use crate::domain::zones::ZoneConfig;
use crate::infrastructure::gate::LiquidityRangeConfig;
use anyhow::{Result, ensure};

/// Engine environment configuration
#[derive(Debug, Clone, Default)]
pub struct EngineEnvConfig {
    pub zone: ZoneConfig,
    pub snapshot: SnapshotConfig,
    pub margin: MarginConfig,
    pub scoring: ScoringConfig,
    pub levels: LevelConfig,
    pub gate: LiquidityRangeConfig,
}

impl EngineEnvConfig {
    pub(crate) fn load(env: &EnvReader<'_>) -> Result<Self> {
        let zd = ZoneConfig::default();
        let zone = ZoneConfig {
            atr_period: env.parse_usize("ZONE_ATR_PERIOD", zd.atr_period)?,
            impulse_atr_mult: env.parse("ZONE_IMPULSE_ATR_MULT", zd.impulse_atr_mult)?,
            zone_width_atr: env.parse("ZONE_WIDTH_ATR", zd.zone_width_atr)?,
            hold_bars: env.parse("ZONE_HOLD_BARS", zd.hold_bars)?,
            impulse_exit_body_mult: env.parse("ZONE_EXIT_BODY_MULT", zd.impulse_exit_body_mult)?,
            avg_body_lookback: env.parse_usize("ZONE_AVG_BODY_LOOKBACK", zd.avg_body_lookback)?,
            max_zone_lifetime: env.parse_u64("ZONE_MAX_LIFETIME", zd.max_zone_lifetime)?,
        };
        ensure!(zone.atr_period > 0, "ZONE_ATR_PERIOD must be positive");

        let sd = SnapshotConfig::default();
        let snapshot = SnapshotConfig {
            window: env.parse_usize("STF_WINDOW", sd.window)?,
            fetch_limit: env.parse_usize("MAX_CANDLES", sd.fetch_limit)?,
            atr_period: zone.atr_period,
        };
        ensure!(
            snapshot.fetch_limit >= snapshot.window,
            "MAX_CANDLES ({}) must be at least STF_WINDOW ({})",
            snapshot.fetch_limit,
            snapshot.window
        );

        let md = MarginConfig::default();
        let margin = MarginConfig {
            min_candles: snapshot.window,
            min_impulse_pct: env.parse_f64("MARGIN_MIN_IMPULSE_PCT", md.min_impulse_pct)?,
            range_to_impulse: env.parse_f64("MARGIN_RANGE_TO_IMPULSE", md.range_to_impulse)?,
        };

        let scoring = ScoringConfig {
            pass_threshold: env.parse("SCORE_PASS_THRESHOLD", ScoringConfig::default().pass_threshold)?,
            ..ScoringConfig::default()
        };

        let ld = LevelConfig::default();
        let levels = LevelConfig {
            min_window: snapshot.window,
            target_fraction: env.parse("LEVEL_TARGET_FRACTION", ld.target_fraction)?,
            extension_fraction: env.parse("LEVEL_EXTENSION_FRACTION", ld.extension_fraction)?,
            stop_fraction: env.parse("LEVEL_STOP_FRACTION", ld.stop_fraction)?,
        };

        let gd = LiquidityRangeConfig::default();
        let gate = LiquidityRangeConfig {
            timeframe: env
                .timeframes("GATE_TF", &gd.timeframe.to_string())?
                .first()
                .copied()
                .unwrap_or(gd.timeframe),
            lookback: env.parse_usize("GATE_LOOKBACK", gd.lookback)?,
            edge_fraction: env.parse_f64("GATE_EDGE_FRACTION", gd.edge_fraction)?,
        };
        ensure!(
            (0.0..=0.5).contains(&gate.edge_fraction),
            "GATE_EDGE_FRACTION must be within 0.0..=0.5"
        );

        Ok(Self {
            zone,
            snapshot,
            margin,
            scoring,
            levels,
            gate,
        })
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            snapshot: self.snapshot.clone(),
            margin: self.margin.clone(),
            scoring: self.scoring.clone(),
            levels: self.levels.clone(),
        }
    }
}
