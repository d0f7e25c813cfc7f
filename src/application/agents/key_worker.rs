use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::application::pipeline::{CycleOrchestrator, CycleOutcome};
use crate::domain::market::candle::SeriesKey;
use crate::domain::ports::{CandleSource, SignalNotifier};
use crate::domain::repositories::{SignalRepository, ZoneRepository};
use crate::domain::signals::types::{Direction, LevelSet, SignalContract};
use crate::domain::zones::{ZoneEngine, ZoneEvent};

/// What one tick produced
#[derive(Debug, Clone)]
pub struct TickReport {
    pub events: Vec<ZoneEvent>,
    pub outcome: CycleOutcome,
    /// The signal differed from the last one and was stored and notified
    pub published: bool,
}

/// Identity of a signal for duplicate suppression
type SignalSignature = (i64, Direction, LevelSet);

fn signature(signal: &SignalContract) -> SignalSignature {
    (signal.base_candle_id, signal.direction, signal.levels)
}

/// Drives one (symbol, timeframe).
///
/// Owns its zone engine, so ticks of one key are serialized and keys never share
/// mutable state. Each tick fetches one window that feeds both the zone engine
/// and the signal pipeline.
pub struct KeyWorker {
    engine: ZoneEngine,
    source: Arc<dyn CandleSource>,
    orchestrator: Arc<CycleOrchestrator>,
    signal_repository: Arc<dyn SignalRepository>,
    zone_repository: Arc<dyn ZoneRepository>,
    notifier: Arc<dyn SignalNotifier>,
    poll_interval: Duration,
    last_published: Option<SignalSignature>,
}

impl KeyWorker {
    pub fn new(
        engine: ZoneEngine,
        source: Arc<dyn CandleSource>,
        orchestrator: Arc<CycleOrchestrator>,
        signal_repository: Arc<dyn SignalRepository>,
        zone_repository: Arc<dyn ZoneRepository>,
        notifier: Arc<dyn SignalNotifier>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            orchestrator,
            signal_repository,
            zone_repository,
            notifier,
            poll_interval,
            last_published: None,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        self.engine.key()
    }

    pub fn engine(&self) -> &ZoneEngine {
        &self.engine
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Seeds duplicate suppression from the last stored signal
    pub async fn restore_last_signal(&mut self) {
        match self.signal_repository.load_latest(self.engine.key()).await {
            Ok(latest) => self.last_published = latest.as_ref().map(signature),
            Err(e) => warn!("KeyWorker [{}]: could not load last signal: {}", self.key(), e),
        }
    }

    /// One fetch, zone update, pipeline cycle and publish
    pub async fn tick(&mut self) -> Result<TickReport> {
        let key = self.engine.key().clone();
        let batch = self
            .source
            .fetch(&key.symbol, key.timeframe, self.orchestrator.fetch_limit())
            .await
            .with_context(|| format!("Failed to fetch candles for {}", key))?;

        // synchronous; the zone update is applied in one step
        let events = self.engine.advance(&batch.candles);
        let outcome = self.orchestrator.evaluate(&key, &batch).await;

        self.record_zone_events(&events).await;

        let published = match &outcome {
            CycleOutcome::Signal(signal) => self.publish(signal).await,
            CycleOutcome::Skipped(_) => false,
        };

        Ok(TickReport {
            events,
            outcome,
            published,
        })
    }

    async fn record_zone_events(&self, events: &[ZoneEvent]) {
        for event in events {
            if let Err(e) = self.zone_repository.append_event(event).await {
                warn!("KeyWorker [{}]: failed to store zone event: {}", self.key(), e);
            }
            if let Err(e) = self.notifier.notify_zone_event(event).await {
                warn!("KeyWorker [{}]: failed to notify zone event: {}", self.key(), e);
            }
        }

        if let Err(e) = self.zone_repository.save_snapshot(&self.engine.snapshot()).await {
            warn!("KeyWorker [{}]: failed to store zone snapshot: {}", self.key(), e);
        }
    }

    async fn publish(&mut self, signal: &SignalContract) -> bool {
        let sig = signature(signal);
        if self.last_published.as_ref() == Some(&sig) {
            return false;
        }

        if let Err(e) = self.signal_repository.save(signal).await {
            error!("KeyWorker [{}]: failed to store signal: {}", self.key(), e);
        }
        if let Err(e) = self.notifier.notify_signal(signal).await {
            warn!("KeyWorker [{}]: failed to notify signal: {}", self.key(), e);
        }
        self.last_published = Some(sig);
        true
    }

    /// Ticks until the stop flag turns true or its sender is dropped.
    ///
    /// A tick that already started always completes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "KeyWorker [{}] started. Interval: {:?}",
            self.key(),
            self.poll_interval
        );
        self.restore_last_signal().await;

        let mut interval = time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) => {
                            if !report.events.is_empty() || report.published {
                                info!(
                                    "KeyWorker [{}]: {} zone events, state {}, signal published: {}",
                                    self.key(),
                                    report.events.len(),
                                    self.engine.state(),
                                    report.published
                                );
                            }
                        }
                        Err(e) => warn!("KeyWorker [{}]: tick failed: {:#}", self.key(), e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("KeyWorker [{}] stopped.", self.key());
    }
}
