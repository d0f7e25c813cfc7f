use super::engine::{ZoneEngine, ZoneSnapshot};
use super::zone::{ZoneConfig, ZoneEvent};
use crate::domain::market::candle::{Candle, SeriesKey};
use std::collections::HashMap;

/// Owns one zone engine per (symbol, timeframe).
///
/// The registry is a plain value handed to whatever drives the scheduling loop.
/// Keying by `SeriesKey` is what guarantees a single active zone per series.
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    config: ZoneConfig,
    engines: HashMap<SeriesKey, ZoneEngine>,
}

impl ZoneRegistry {
    pub fn new(config: ZoneConfig) -> Self {
        Self {
            config,
            engines: HashMap::new(),
        }
    }

    /// Creates an engine for each key that does not have one yet
    pub fn with_keys(config: ZoneConfig, keys: impl IntoIterator<Item = SeriesKey>) -> Self {
        let mut registry = Self::new(config);
        for key in keys {
            registry.engine_mut(&key);
        }
        registry
    }

    pub fn engine_mut(&mut self, key: &SeriesKey) -> &mut ZoneEngine {
        let config = &self.config;
        self.engines
            .entry(key.clone())
            .or_insert_with(|| ZoneEngine::new(key.clone(), config.clone()))
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&ZoneEngine> {
        self.engines.get(key)
    }

    /// Feeds a candle window to the engine of `key`, creating it on first use
    pub fn advance(&mut self, key: &SeriesKey, candles: &[Candle]) -> Vec<ZoneEvent> {
        self.engine_mut(key).advance(candles)
    }

    /// Replaces the engine of a key with one rebuilt from a persisted snapshot
    pub fn restore(&mut self, snapshot: ZoneSnapshot) {
        let engine = ZoneEngine::restore(self.config.clone(), snapshot);
        self.engines.insert(engine.key().clone(), engine);
    }

    pub fn snapshots(&self) -> Vec<ZoneSnapshot> {
        let mut out: Vec<ZoneSnapshot> = self.engines.values().map(ZoneEngine::snapshot).collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<SeriesKey> = self.engines.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Hands every engine out by value, e.g. to one worker task per key
    pub fn into_engines(self) -> Vec<ZoneEngine> {
        let mut engines: Vec<ZoneEngine> = self.engines.into_values().collect();
        engines.sort_by(|a, b| a.key().cmp(b.key()));
        engines
    }
}
