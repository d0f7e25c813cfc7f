//! In-Memory Repository Implementations
//!
//! Thread-safe, in-memory implementations of the repository traits defined in
//! `domain::repositories`.
//!
//! # Features
//!
//! - **Thread-safe**: Uses `Arc<RwLock>` for concurrent access
//! - **Testing**: Ideal for unit tests and the one-shot scanner
//!
//! # Limitations
//!
//! - Data is lost on restart; the server uses the SQLite implementations
//! - History grows without bound

use crate::domain::market::candle::SeriesKey;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::repositories::{SignalRepository, ZoneRepository};
use crate::domain::signals::types::SignalContract;
use crate::domain::zones::{ZoneEvent, ZoneSnapshot};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;

fn signal_key(signal: &SignalContract) -> Option<SeriesKey> {
    Timeframe::from_str(&signal.timeframe)
        .ok()
        .map(|tf| SeriesKey::new(signal.symbol.clone(), tf))
}

/// In-memory implementation of SignalRepository
#[derive(Clone, Default)]
pub struct InMemorySignalRepository {
    latest: Arc<RwLock<HashMap<SeriesKey, SignalContract>>>,
    history: Arc<RwLock<Vec<SignalContract>>>,
}

impl InMemorySignalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.history.read().await.len()
    }
}

#[async_trait]
impl SignalRepository for InMemorySignalRepository {
    async fn save(&self, signal: &SignalContract) -> Result<()> {
        let key = signal_key(signal)
            .ok_or_else(|| anyhow::anyhow!("Unknown timeframe '{}' on signal", signal.timeframe))?;
        self.latest.write().await.insert(key, signal.clone());
        self.history.write().await.push(signal.clone());
        Ok(())
    }

    async fn load_latest(&self, key: &SeriesKey) -> Result<Option<SignalContract>> {
        Ok(self.latest.read().await.get(key).cloned())
    }

    async fn history(&self, key: &SeriesKey, limit: usize) -> Result<Vec<SignalContract>> {
        let history = self.history.read().await;
        Ok(history
            .iter()
            .rev()
            .filter(|s| signal_key(s).as_ref() == Some(key))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory implementation of ZoneRepository
#[derive(Clone, Default)]
pub struct InMemoryZoneRepository {
    events: Arc<RwLock<Vec<ZoneEvent>>>,
    snapshots: Arc<RwLock<HashMap<SeriesKey, ZoneSnapshot>>>,
}

impl InMemoryZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ZoneRepository for InMemoryZoneRepository {
    async fn append_event(&self, event: &ZoneEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &ZoneSnapshot) -> Result<()> {
        self.snapshots
            .write()
            .await
            .insert(snapshot.key.clone(), snapshot.clone());
        Ok(())
    }

    async fn load_snapshot(&self, key: &SeriesKey) -> Result<Option<ZoneSnapshot>> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }

    async fn load_snapshots(&self) -> Result<Vec<ZoneSnapshot>> {
        let mut all: Vec<ZoneSnapshot> = self.snapshots.read().await.values().cloned().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(all)
    }

    async fn events(&self, key: &SeriesKey, limit: usize) -> Result<Vec<ZoneEvent>> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .rev()
            .filter(|e| &e.key == key)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::candle::DataHealth;
    use crate::domain::signals::types::{
        Bias, Confidence, Direction, GateContext, GatePosition, LevelSet,
    };
    use crate::domain::zones::ZoneState;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn signal(symbol: &str, timeframe: &str, base: i64) -> SignalContract {
        SignalContract {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            direction: Direction::Long,
            score: 70,
            confidence: Confidence::Mid,
            mtf_bias: Bias::Long,
            gate_context: GateContext {
                pass: true,
                position: GatePosition::Inside,
                bias: Bias::Long,
            },
            margin_pass: true,
            levels: LevelSet {
                A: dec!(110),
                C: dec!(100),
                D: dec!(120),
                F: dec!(90),
                X: dec!(125),
                Y: dec!(85),
                TP1: dec!(105),
                TP2: dec!(120),
                TP3: dec!(125),
                SL: dec!(97.5),
            },
            base_candle_id: base,
            data_health: DataHealth::Live,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_signal_repository_latest_per_key() {
        let repo = InMemorySignalRepository::new();
        repo.save(&signal("ADAUSDT", "15", 1)).await.unwrap();
        repo.save(&signal("ADAUSDT", "15", 2)).await.unwrap();
        repo.save(&signal("ADAUSDT", "60", 3)).await.unwrap();

        let key = SeriesKey::new("ADAUSDT", Timeframe::FifteenMin);
        let latest = repo.load_latest(&key).await.unwrap().unwrap();
        assert_eq!(latest.base_candle_id, 2);

        let history = repo.history(&key, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].base_candle_id, 2);
        assert_eq!(repo.count().await, 3);
    }

    #[tokio::test]
    async fn test_zone_repository_snapshot_upsert() {
        let repo = InMemoryZoneRepository::new();
        let key = SeriesKey::new("INJUSDT", Timeframe::FiveMin);
        let mut snapshot = ZoneSnapshot {
            key: key.clone(),
            state: ZoneState::Wait,
            zone: None,
            bars_processed: 10,
            last_timestamp: Some(100),
        };
        repo.save_snapshot(&snapshot).await.unwrap();
        snapshot.bars_processed = 11;
        repo.save_snapshot(&snapshot).await.unwrap();

        assert_eq!(repo.load_snapshots().await.unwrap().len(), 1);
        assert_eq!(repo.load_snapshot(&key).await.unwrap().unwrap().bars_processed, 11);
        assert!(repo.events(&key, 5).await.unwrap().is_empty());
    }
}
