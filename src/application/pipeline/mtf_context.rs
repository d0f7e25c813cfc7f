use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::CandleSource;
use crate::domain::signals::mtf::{
    MTF_FETCH_LIMIT, MTF_MIN_CANDLES, TimeframeBias, analyze_tf_bias, merge_biases,
};
use crate::domain::signals::types::MtfContext;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the higher-timeframe context used by scoring.
///
/// Never fails: timeframes that cannot be fetched or are too short are skipped,
/// and with none left the context is neutral.
pub struct MtfContextBuilder {
    source: Arc<dyn CandleSource>,
    timeframes: Vec<Timeframe>,
}

impl MtfContextBuilder {
    pub fn new(source: Arc<dyn CandleSource>, timeframes: Vec<Timeframe>) -> Self {
        Self { source, timeframes }
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub async fn build(&self, symbol: &str) -> MtfContext {
        let mut reads: Vec<TimeframeBias> = Vec::with_capacity(self.timeframes.len());

        for &tf in &self.timeframes {
            let batch = match self.source.fetch(symbol, tf, MTF_FETCH_LIMIT).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("MtfContext [{}/{}]: fetch failed, skipping: {}", symbol, tf, e);
                    continue;
                }
            };

            if batch.len() < MTF_MIN_CANDLES {
                debug!(
                    "MtfContext [{}/{}]: only {} candles, skipping",
                    symbol,
                    tf,
                    batch.len()
                );
                continue;
            }

            reads.push(analyze_tf_bias(&batch.candles));
        }

        let context = merge_biases(&reads);
        debug!(
            "MtfContext [{}]: bias={} strength={} from {} timeframes",
            symbol,
            context.bias,
            context.strength,
            reads.len()
        );
        context
    }
}
