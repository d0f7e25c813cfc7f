use crate::domain::market::candle::{Candle, CandleBatch, DataHealth, SeriesKey};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CandleSource, SignalNotifier, StructureGate};
use crate::domain::signals::types::{GateContext, SignalContract};
use crate::domain::zones::ZoneEvent;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Candle source serving series set by the caller.
///
/// `fetch` returns the newest `limit` candles of the series; a key without a
/// series, or one marked failing, returns an error like a dead exchange would.
#[derive(Clone)]
pub struct MockCandleSource {
    series: Arc<RwLock<HashMap<SeriesKey, Vec<Candle>>>>,
    failing: Arc<RwLock<bool>>,
    health: DataHealth,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockCandleSource {
    fn default() -> Self {
        Self::with_health(DataHealth::Live)
    }
}

impl MockCandleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches come back tagged as synthetic
    pub fn synthetic() -> Self {
        Self::with_health(DataHealth::Synthetic)
    }

    fn with_health(health: DataHealth) -> Self {
        Self {
            series: Arc::new(RwLock::new(HashMap::new())),
            failing: Arc::new(RwLock::new(false)),
            health,
            calls: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn set_series(&self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) {
        self.series
            .write()
            .await
            .insert(SeriesKey::new(symbol, timeframe), candles);
    }

    /// Appends bars to an existing series, creating it if needed
    pub async fn push_candles(&self, symbol: &str, timeframe: Timeframe, candles: Vec<Candle>) {
        self.series
            .write()
            .await
            .entry(SeriesKey::new(symbol, timeframe))
            .or_default()
            .extend(candles);
    }

    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    pub async fn calls(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl CandleSource for MockCandleSource {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<CandleBatch> {
        *self.calls.write().await += 1;
        if *self.failing.read().await {
            anyhow::bail!("MockCandleSource: simulated outage for {}/{}", symbol, timeframe);
        }

        let series = self.series.read().await;
        let candles = series
            .get(&SeriesKey::new(symbol, timeframe))
            .ok_or_else(|| anyhow::anyhow!("MockCandleSource: no series for {}/{}", symbol, timeframe))?;

        let start = candles.len().saturating_sub(limit);
        debug!(
            "MockCandleSource [{}/{}]: serving {} candles",
            symbol,
            timeframe,
            candles.len() - start
        );
        Ok(CandleBatch {
            candles: candles[start..].to_vec(),
            health: self.health,
        })
    }
}

/// Gate answering a fixed context, or failing when none is set
#[derive(Clone)]
pub struct MockStructureGate {
    context: Arc<RwLock<Option<GateContext>>>,
}

impl MockStructureGate {
    pub fn new(context: GateContext) -> Self {
        Self {
            context: Arc::new(RwLock::new(Some(context))),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            context: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_context(&self, context: Option<GateContext>) {
        *self.context.write().await = context;
    }
}

#[async_trait]
impl StructureGate for MockStructureGate {
    async fn check(&self, symbol: &str) -> Result<GateContext> {
        self.context
            .read()
            .await
            .ok_or_else(|| anyhow::anyhow!("MockStructureGate: no context for {}", symbol))
    }
}

/// Notifier keeping everything it was sent
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub signals: Arc<RwLock<Vec<SignalContract>>>,
    pub zone_events: Arc<RwLock<Vec<ZoneEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalNotifier for RecordingNotifier {
    async fn notify_signal(&self, signal: &SignalContract) -> Result<()> {
        self.signals.write().await.push(signal.clone());
        Ok(())
    }

    async fn notify_zone_event(&self, event: &ZoneEvent) -> Result<()> {
        self.zone_events.write().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signals::types::{Bias, GatePosition};
    use rust_decimal_macros::dec;

    fn candles(n: i64) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle::new(i * 60_000, dec!(1), dec!(2), dec!(0.5), dec!(1.5)))
            .collect()
    }

    #[tokio::test]
    async fn test_source_serves_tail_and_fails_on_demand() {
        let source = MockCandleSource::new();
        source.set_series("ADAUSDT", Timeframe::OneMin, candles(10)).await;

        let batch = source.fetch("ADAUSDT", Timeframe::OneMin, 3).await.unwrap();
        assert_eq!(batch.candles.len(), 3);
        assert_eq!(batch.candles[0].timestamp, 7 * 60_000);
        assert_eq!(batch.health, DataHealth::Live);

        assert!(source.fetch("ADAUSDT", Timeframe::FiveMin, 3).await.is_err());

        source.set_failing(true).await;
        assert!(source.fetch("ADAUSDT", Timeframe::OneMin, 3).await.is_err());
        assert_eq!(source.calls().await, 3);
    }

    #[tokio::test]
    async fn test_gate_switches_context() {
        let gate = MockStructureGate::new(GateContext {
            pass: true,
            position: GatePosition::Inside,
            bias: Bias::Long,
        });
        assert!(gate.check("X").await.unwrap().pass);

        gate.set_context(None).await;
        assert!(gate.check("X").await.is_err());
    }
}
