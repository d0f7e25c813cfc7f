//! Repository Pattern Abstractions
//!
//! Persistence of pipeline output and zone state, kept behind traits so the
//! workers never depend on a storage engine.
//!
//! - `SignalRepository`: latest signal per series plus an append-only history
//! - `ZoneRepository`: zone transition log plus one snapshot row per series
//!
//! Both are last-writer-wins per `SeriesKey`. The `InMemory` implementations use
//! `Arc<RwLock>`; the SQLite ones live in `infrastructure::persistence`.
//!
//! # Example
//!
//! ```rust,no_run
//! use marginzone::domain::repositories::SignalRepository;
//! use marginzone::infrastructure::InMemorySignalRepository;
//!
//! # async {
//! let repo = InMemorySignalRepository::new();
//! // repo.save(&signal).await?;
//! // let latest = repo.load_latest(&key).await?;
//! # };
//! ```

use crate::domain::market::candle::SeriesKey;
use crate::domain::signals::types::SignalContract;
use crate::domain::zones::{ZoneEvent, ZoneSnapshot};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait SignalRepository: Send + Sync {
    /// Replace the latest signal of its series and append it to the history
    async fn save(&self, signal: &SignalContract) -> Result<()>;

    async fn load_latest(&self, key: &SeriesKey) -> Result<Option<SignalContract>>;

    /// Most recent signals of a series, newest first
    async fn history(&self, key: &SeriesKey, limit: usize) -> Result<Vec<SignalContract>>;
}

#[async_trait]
pub trait ZoneRepository: Send + Sync {
    async fn append_event(&self, event: &ZoneEvent) -> Result<()>;

    /// Upsert the engine snapshot of its series
    async fn save_snapshot(&self, snapshot: &ZoneSnapshot) -> Result<()>;

    async fn load_snapshot(&self, key: &SeriesKey) -> Result<Option<ZoneSnapshot>>;

    async fn load_snapshots(&self) -> Result<Vec<ZoneSnapshot>>;

    /// Most recent events of a series, newest first
    async fn events(&self, key: &SeriesKey, limit: usize) -> Result<Vec<ZoneEvent>>;
}
