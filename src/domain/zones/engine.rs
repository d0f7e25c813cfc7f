//! Margin zone state machine.
//!
//! One engine per (symbol, timeframe). The engine is fed the fetched candle window
//! on every tick and replays every bar it has not seen yet, so re-delivering the
//! same window is a no-op and polling cadence does not change the outcome.
//!
//! Per bar, once enough history exists:
//! 1. no active zone: an impulse candle (`range >= ATR * mult`) seeds a zone;
//! 2. lifetime expiry (more than `max_zone_lifetime` bars since the impulse)
//!    destroys the zone; bars are counted on the clock too, so a restart gap
//!    ages the zone even though those bars were never processed;
//! 3. a close beyond a boundary with a large body is an impulsive exit;
//! 4. otherwise the zone is entered, accumulates inside bars, records false
//!    breaks and reaches `Hold`.

use super::zone::{Zone, ZoneConfig, ZoneEvent, ZoneState};
use crate::domain::market::candle::{Candle, SeriesKey};
use crate::domain::market::volatility::{average_body, calculate_atr};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Serializable engine state, one row per key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSnapshot {
    pub key: SeriesKey,
    pub state: ZoneState,
    pub zone: Option<Zone>,
    pub bars_processed: u64,
    pub last_timestamp: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ZoneEngine {
    key: SeriesKey,
    config: ZoneConfig,
    active_zone: Option<Zone>,
    /// Number of bars processed so far; the next bar gets this index
    bars_processed: u64,
    last_timestamp: Option<i64>,
}

impl ZoneEngine {
    pub fn new(key: SeriesKey, config: ZoneConfig) -> Self {
        Self {
            key,
            config,
            active_zone: None,
            bars_processed: 0,
            last_timestamp: None,
        }
    }

    /// Rebuilds an engine from a persisted snapshot
    pub fn restore(config: ZoneConfig, snapshot: ZoneSnapshot) -> Self {
        Self {
            key: snapshot.key,
            config,
            active_zone: snapshot.zone.filter(|z| !z.state.is_terminal()),
            bars_processed: snapshot.bars_processed,
            last_timestamp: snapshot.last_timestamp,
        }
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    pub fn active_zone(&self) -> Option<&Zone> {
        self.active_zone.as_ref()
    }

    pub fn state(&self) -> ZoneState {
        self.active_zone
            .as_ref()
            .map(|z| z.state)
            .unwrap_or(ZoneState::Wait)
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_processed
    }

    pub fn snapshot(&self) -> ZoneSnapshot {
        ZoneSnapshot {
            key: self.key.clone(),
            state: self.state(),
            zone: self.active_zone.clone(),
            bars_processed: self.bars_processed,
            last_timestamp: self.last_timestamp,
        }
    }

    /// Processes every candle newer than the last one seen, oldest first.
    ///
    /// `candles` must be ordered newest last.
    pub fn advance(&mut self, candles: &[Candle]) -> Vec<ZoneEvent> {
        let start = match self.last_timestamp {
            Some(last) => candles.partition_point(|c| c.timestamp <= last),
            None => 0,
        };

        (start..candles.len())
            .filter_map(|i| self.step(&candles[..=i]))
            .collect()
    }

    /// Processes the last candle of `history` as a new bar.
    ///
    /// Returns `None` when the bar was already seen, when history is too short,
    /// or when the bar causes no transition.
    pub fn step(&mut self, history: &[Candle]) -> Option<ZoneEvent> {
        let candle = history.last()?;
        if let Some(last) = self.last_timestamp
            && candle.timestamp <= last
        {
            return None;
        }

        let bar = self.bars_processed;
        self.bars_processed += 1;
        self.last_timestamp = Some(candle.timestamp);

        if history.len() < self.config.min_history() {
            return None;
        }
        let atr = calculate_atr(history, self.config.atr_period)?;
        let avg_body = average_body(history, self.config.avg_body_lookback)?;

        let Some(mut zone) = self.active_zone.take() else {
            return self.try_create(candle, atr, bar);
        };

        let Some(state) = self.transition(&mut zone, candle, bar, avg_body) else {
            self.active_zone = Some(zone);
            return None;
        };

        let event = ZoneEvent {
            key: self.key.clone(),
            state,
            zone: zone.clone(),
            bar_timestamp: candle.timestamp,
        };

        if state.is_terminal() {
            info!(
                "ZoneEngine [{}]: zone {} {} after {} bars ({} false breaks)",
                self.key,
                zone.id,
                state,
                self.bars_since_creation(&zone, candle, bar),
                zone.false_break_count
            );
        } else {
            debug!(
                "ZoneEngine [{}]: zone {} -> {} (inside_bars={}, false_breaks={})",
                self.key, zone.id, state, zone.inside_bars, zone.false_break_count
            );
            self.active_zone = Some(zone);
        }

        Some(event)
    }

    pub fn is_impulse(&self, candle: &Candle, atr: Decimal) -> bool {
        atr > Decimal::ZERO && candle.range() >= atr * self.config.impulse_atr_mult
    }

    fn try_create(&mut self, candle: &Candle, atr: Decimal, bar: u64) -> Option<ZoneEvent> {
        if !self.is_impulse(candle, atr) {
            return None;
        }

        let zone = Zone::from_impulse(&self.key, candle, atr, self.config.zone_width_atr, bar)?;
        info!(
            "ZoneEngine [{}]: zone {} CREATED [{} - {}] (ATR {:.4})",
            self.key,
            zone.id,
            zone.lower,
            zone.upper,
            atr
        );

        let event = ZoneEvent {
            key: self.key.clone(),
            state: ZoneState::Created,
            zone: zone.clone(),
            bar_timestamp: candle.timestamp,
        };
        self.active_zone = Some(zone);
        Some(event)
    }

    /// Timeframe bars between the impulse candle and `candle`, taking the larger of
    /// the processed-bar count and the timestamp distance
    fn bars_since_creation(&self, zone: &Zone, candle: &Candle, bar: u64) -> u64 {
        let processed = bar.saturating_sub(zone.created_bar);
        let step = self.key.timeframe.to_millis();
        if step <= 0 {
            return processed;
        }
        let elapsed = u64::try_from((candle.timestamp - zone.created_at) / step).unwrap_or(0);
        processed.max(elapsed)
    }

    /// Applies one bar to an active zone and returns the new state if it changed
    /// (or a false break occurred).
    fn transition(
        &self,
        zone: &mut Zone,
        candle: &Candle,
        bar: u64,
        avg_body: Decimal,
    ) -> Option<ZoneState> {
        if self.bars_since_creation(zone, candle, bar) > self.config.max_zone_lifetime {
            zone.state = ZoneState::Expired;
            return Some(ZoneState::Expired);
        }

        if zone.is_closed_outside(candle)
            && candle.body() >= avg_body * self.config.impulse_exit_body_mult
        {
            zone.state = ZoneState::ExitImpulse;
            return Some(ZoneState::ExitImpulse);
        }

        let inside = zone.contains(candle.close);

        if zone.state == ZoneState::Created {
            if inside {
                zone.state = ZoneState::Entered;
                zone.inside_bars = 1;
                return Some(ZoneState::Entered);
            }
            return None;
        }

        if !zone.state.is_accumulating() {
            return None;
        }

        zone.inside_bars = if inside { zone.inside_bars + 1 } else { 0 };

        if zone.is_false_break(candle) {
            zone.false_break_count += 1;
            zone.state = ZoneState::FalseBreak;
            return Some(ZoneState::FalseBreak);
        }

        if zone.inside_bars >= self.config.hold_bars && zone.state != ZoneState::Hold {
            zone.state = ZoneState::Hold;
            return Some(ZoneState::Hold);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::timeframe::Timeframe;
    use rust_decimal_macros::dec;

    const STEP_MS: i64 = 60_000;

    fn key() -> SeriesKey {
        SeriesKey::new("TEST", Timeframe::OneMin)
    }

    /// 20 quiet bars: range 100 (TR 100), body 10
    fn quiet_history() -> Vec<Candle> {
        (0..20)
            .map(|i| Candle::new(i * STEP_MS, dec!(1000), dec!(1050), dec!(950), dec!(1010)))
            .collect()
    }

    fn push(candles: &mut Vec<Candle>, open: Decimal, high: Decimal, low: Decimal, close: Decimal) {
        let ts = candles.last().map(|c| c.timestamp + STEP_MS).unwrap_or(0);
        candles.push(Candle::new(ts, open, high, low, close));
    }

    fn engine_with_zone() -> (ZoneEngine, Vec<Candle>) {
        let mut engine = ZoneEngine::new(key(), ZoneConfig::default());
        let mut candles = quiet_history();
        assert!(engine.advance(&candles).is_empty());

        // Range 400 vs ATR ~121 => impulse, midpoint 1100
        push(&mut candles, dec!(920), dec!(1300), dec!(900), dec!(1280));
        let events = engine.advance(&candles);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state, ZoneState::Created);
        (engine, candles)
    }

    #[test]
    fn test_no_events_without_history() {
        let mut engine = ZoneEngine::new(key(), ZoneConfig::default());
        let mut candles: Vec<Candle> = quiet_history().into_iter().take(10).collect();
        push(&mut candles, dec!(900), dec!(2000), dec!(800), dec!(1900));

        assert!(engine.advance(&candles).is_empty());
        assert_eq!(engine.state(), ZoneState::Wait);
        assert_eq!(engine.bars_processed(), 11);
    }

    #[test]
    fn test_zone_created_on_impulse() {
        let (engine, _) = engine_with_zone();
        let zone = engine.active_zone().unwrap();
        assert_eq!(zone.center, dec!(1100));
        assert!(zone.lower < zone.center && zone.center < zone.upper);
        assert_eq!(engine.state(), ZoneState::Created);
    }

    #[test]
    fn test_redelivered_window_is_noop() {
        let (mut engine, candles) = engine_with_zone();
        let before = engine.snapshot();
        assert!(engine.advance(&candles).is_empty());
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn test_enter_then_hold() {
        let (mut engine, mut candles) = engine_with_zone();

        push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1100));
        let events = engine.advance(&candles);
        assert_eq!(events[0].state, ZoneState::Entered);
        assert_eq!(events[0].zone.inside_bars, 1);

        let mut states = Vec::new();
        for _ in 0..5 {
            push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1102));
            states.extend(engine.advance(&candles).into_iter().map(|e| e.state));
        }
        // Counter reaches 5 on the 4th extra bar; HOLD is reported once
        assert_eq!(states, vec![ZoneState::Hold]);
        assert_eq!(engine.active_zone().unwrap().inside_bars, 6);
    }

    #[test]
    fn test_false_break_is_not_terminal() {
        let (mut engine, mut candles) = engine_with_zone();
        push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1100));
        engine.advance(&candles);

        let upper = engine.active_zone().unwrap().upper;
        push(&mut candles, dec!(1100), upper + dec!(20), dec!(1095), dec!(1105));
        let events = engine.advance(&candles);

        assert_eq!(events[0].state, ZoneState::FalseBreak);
        assert_eq!(events[0].zone.false_break_count, 1);
        assert!(engine.active_zone().is_some());
    }

    #[test]
    fn test_impulsive_exit_destroys_zone() {
        let (mut engine, mut candles) = engine_with_zone();
        push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1100));
        engine.advance(&candles);

        // Closes far above the zone with a big body
        push(&mut candles, dec!(1100), dec!(1500), dec!(1095), dec!(1480));
        let events = engine.advance(&candles);

        assert_eq!(events[0].state, ZoneState::ExitImpulse);
        assert!(engine.active_zone().is_none());
        assert_eq!(engine.state(), ZoneState::Wait);
    }

    #[test]
    fn test_small_body_close_outside_is_not_exit() {
        let (mut engine, mut candles) = engine_with_zone();
        push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1100));
        engine.advance(&candles);

        let upper = engine.active_zone().unwrap().upper;
        // Gaps above, tiny body
        push(&mut candles, upper + dec!(10), upper + dec!(15), upper + dec!(5), upper + dec!(11));
        let events = engine.advance(&candles);

        assert!(events.is_empty());
        assert_eq!(engine.active_zone().unwrap().inside_bars, 0);
    }

    #[test]
    fn test_zone_expires_after_lifetime() {
        let config = ZoneConfig {
            max_zone_lifetime: 3,
            ..ZoneConfig::default()
        };
        let mut engine = ZoneEngine::new(key(), config);
        let mut candles = quiet_history();
        push(&mut candles, dec!(920), dec!(1300), dec!(900), dec!(1280));
        engine.advance(&candles);
        assert_eq!(engine.state(), ZoneState::Created);

        // Stay outside the zone with small bodies so nothing else happens
        let mut last = Vec::new();
        for _ in 0..4 {
            push(&mut candles, dec!(1300), dec!(1305), dec!(1295), dec!(1301));
            last = engine.advance(&candles);
        }
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].state, ZoneState::Expired);
        assert_eq!(engine.state(), ZoneState::Wait);
    }

    #[test]
    fn test_restart_gap_counts_toward_lifetime() {
        let (engine, mut candles) = engine_with_zone();
        let snapshot = engine.snapshot();
        let created_at = snapshot.zone.as_ref().unwrap().created_at;

        // the service is down for 80 bars; the next window resumes after the gap
        candles.extend((81..86).map(|offset| {
            let ts = created_at + offset * STEP_MS;
            Candle::new(ts, dec!(1300), dec!(1305), dec!(1295), dec!(1301))
        }));

        let mut restored = ZoneEngine::restore(ZoneConfig::default(), snapshot);
        let events = restored.advance(&candles);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state, ZoneState::Expired);
        assert_eq!(events[0].bar_timestamp, created_at + 81 * STEP_MS);
        assert_eq!(restored.state(), ZoneState::Wait);
    }

    #[test]
    fn test_snapshot_restore_round_trip() {
        let (engine, mut candles) = engine_with_zone();
        let mut restored = ZoneEngine::restore(ZoneConfig::default(), engine.snapshot());
        let mut original = engine;

        push(&mut candles, dec!(1100), dec!(1110), dec!(1090), dec!(1100));
        assert_eq!(original.advance(&candles), restored.advance(&candles));
    }
}
