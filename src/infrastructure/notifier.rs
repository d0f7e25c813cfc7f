//! Structured-log notifier.
//!
//! Signals and zone transitions are written as one `info!` line each with the
//! full record as JSON behind a fixed prefix, so they can be grepped out of the
//! service logs and fed to any downstream consumer.

use crate::domain::ports::SignalNotifier;
use crate::domain::signals::types::SignalContract;
use crate::domain::zones::ZoneEvent;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub const SIGNAL_PREFIX: &str = "SIGNAL_JSON:";
pub const ZONE_PREFIX: &str = "ZONE_JSON:";

#[derive(Debug, Default)]
pub struct TracingNotifier {
    signals_sent: AtomicU64,
    zone_events_sent: AtomicU64,
}

impl TracingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signals_sent(&self) -> u64 {
        self.signals_sent.load(Ordering::Relaxed)
    }

    pub fn zone_events_sent(&self) -> u64 {
        self.zone_events_sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SignalNotifier for TracingNotifier {
    async fn notify_signal(&self, signal: &SignalContract) -> Result<()> {
        let json = serde_json::to_string(signal).context("Failed to encode signal")?;
        info!(
            symbol = %signal.symbol,
            timeframe = %signal.timeframe,
            direction = %signal.direction,
            score = signal.score,
            confidence = %signal.confidence,
            health = %signal.data_health,
            "{}{}",
            SIGNAL_PREFIX,
            json
        );
        self.signals_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn notify_zone_event(&self, event: &ZoneEvent) -> Result<()> {
        let json = serde_json::to_string(event).context("Failed to encode zone event")?;
        info!(
            key = %event.key,
            state = %event.state,
            zone = %event.zone.id,
            "{}{}",
            ZONE_PREFIX,
            json
        );
        self.zone_events_sent.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
