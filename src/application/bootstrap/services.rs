use std::sync::Arc;
use tracing::{info, warn};

use crate::application::pipeline::{CycleOrchestrator, MtfContextBuilder};
use crate::config::Config;
use crate::domain::ports::{CandleSource, SignalNotifier, StructureGate};
use crate::domain::signals::final_candle::MaxImpulseSelector;
use crate::infrastructure::{
    BybitCandleSource, FallbackCandleSource, LiquidityRangeGate, StaticPrecisionTable,
    SyntheticCandleSource, TracingNotifier,
};

pub struct ServicesHandle {
    pub candle_source: Arc<dyn CandleSource>,
    pub gate: Arc<dyn StructureGate>,
    pub orchestrator: Arc<CycleOrchestrator>,
    pub notifier: Arc<dyn SignalNotifier>,
}

pub struct ServicesBootstrap;

impl ServicesBootstrap {
    /// Wires the candle source, gate and pipeline from the configuration.
    ///
    /// The gate and the MTF builder share the signal source, so an offline run
    /// is offline end to end.
    pub fn init(config: &Config) -> ServicesHandle {
        let source_config = &config.source;
        if source_config.offline {
            warn!("Offline mode: every candle batch is synthetic");
        }

        let live: Arc<dyn CandleSource> = Arc::new(BybitCandleSource::new(
            source_config.bybit_base_url.clone(),
            source_config.http_max_retries,
        ));
        let candle_source: Arc<dyn CandleSource> = Arc::new(FallbackCandleSource::new(
            live,
            SyntheticCandleSource::new(source_config.synthetic_seed),
            source_config.offline,
        ));

        let gate: Arc<dyn StructureGate> = Arc::new(LiquidityRangeGate::new(
            candle_source.clone(),
            config.engine.gate.clone(),
        ));

        let precision = Arc::new(StaticPrecisionTable::new(
            config.service.price_decimals.clone(),
            config.service.default_price_decimals,
        ));

        let orchestrator = Arc::new(CycleOrchestrator::new(
            candle_source.clone(),
            gate.clone(),
            MtfContextBuilder::new(candle_source.clone(), config.service.mtf_timeframes.clone()),
            Arc::new(MaxImpulseSelector::new(config.engine.snapshot.window)),
            precision,
            config.engine.pipeline(),
        ));

        info!(
            "Services ready: source={} gate_tf={} mtf={:?}",
            if source_config.offline { "synthetic" } else { source_config.bybit_base_url.as_str() },
            config.engine.gate.timeframe,
            config.service.mtf_timeframes
        );

        ServicesHandle {
            candle_source,
            gate,
            orchestrator,
            notifier: Arc::new(TracingNotifier::new()),
        }
    }
}
