#![allow(dead_code)]

use marginzone::application::pipeline::{CycleOrchestrator, MtfContextBuilder, PipelineConfig};
use marginzone::domain::market::candle::Candle;
use marginzone::domain::market::timeframe::Timeframe;
use marginzone::domain::signals::final_candle::MaxImpulseSelector;
use marginzone::domain::signals::types::{Bias, GateContext, GatePosition};
use marginzone::infrastructure::StaticPrecisionTable;
use marginzone::infrastructure::mock::{MockCandleSource, MockStructureGate};
use rust_decimal::Decimal;
use std::sync::Arc;

pub const SYMBOL: &str = "ADAUSDT";
pub const TF: Timeframe = Timeframe::FifteenMin;
pub const IMPULSE_INDEX: usize = 190;

pub fn gate(position: GatePosition, bias: Bias) -> GateContext {
    GateContext {
        pass: true,
        position,
        bias,
    }
}

/// 200 bullish bars drifting from 100 to 119.9, two points of range each, with
/// one wide bar at `IMPULSE_INDEX` (open 119, high 126, low 118.5, close 125.5).
///
/// Snapshot of the last 180: impulse ~6.3%, range ~21%, ATR well below the
/// impulse, so only gate position and MTF decide the score.
pub fn trending_series(timeframe: Timeframe) -> Vec<Candle> {
    let step = timeframe.to_millis();
    (0..200)
        .map(|i| {
            let ts = 1_700_000_000_000 + i as i64 * step;
            if i == IMPULSE_INDEX {
                return Candle::new(
                    ts,
                    Decimal::from(119),
                    Decimal::from(126),
                    Decimal::new(1185, 1),
                    Decimal::new(1255, 1),
                );
            }
            let base = Decimal::from(100) + Decimal::new(i as i64, 1);
            Candle::new(
                ts,
                base,
                base + Decimal::ONE,
                base - Decimal::ONE,
                base + Decimal::new(5, 1),
            )
        })
        .collect()
}

/// 200 bars with a 0.5% range: never enough impulse for the margin check
pub fn quiet_series(timeframe: Timeframe) -> Vec<Candle> {
    let step = timeframe.to_millis();
    (0..200)
        .map(|i| {
            Candle::new(
                1_700_000_000_000 + i as i64 * step,
                Decimal::from(100),
                Decimal::new(10025, 2),
                Decimal::new(9975, 2),
                Decimal::new(10010, 2),
            )
        })
        .collect()
}

pub fn bearish_series(timeframe: Timeframe, len: usize) -> Vec<Candle> {
    let step = timeframe.to_millis();
    (0..len)
        .map(|i| {
            Candle::new(
                1_700_000_000_000 + i as i64 * step,
                Decimal::from(50),
                Decimal::from(51),
                Decimal::from(48),
                Decimal::from(49),
            )
        })
        .collect()
}

pub fn orchestrator(
    source: &MockCandleSource,
    gate: &MockStructureGate,
    mtf_timeframes: Vec<Timeframe>,
) -> Arc<CycleOrchestrator> {
    let source = Arc::new(source.clone());
    Arc::new(CycleOrchestrator::new(
        source.clone(),
        Arc::new(gate.clone()),
        MtfContextBuilder::new(source, mtf_timeframes),
        Arc::new(MaxImpulseSelector::default()),
        Arc::new(StaticPrecisionTable::default()),
        PipelineConfig::default(),
    ))
}
