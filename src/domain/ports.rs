use crate::domain::market::candle::{Candle, CandleBatch};
use crate::domain::market::timeframe::Timeframe;
use crate::domain::signals::types::{Direction, GateContext, SignalContract};
use crate::domain::zones::ZoneEvent;
use anyhow::Result;
use async_trait::async_trait;

/// Source of closed candles, ordered oldest first
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch(&self, symbol: &str, timeframe: Timeframe, limit: usize) -> Result<CandleBatch>;
}

/// External market-structure gate deciding eligibility and direction
#[async_trait]
pub trait StructureGate: Send + Sync {
    async fn check(&self, symbol: &str) -> Result<GateContext>;
}

/// Chooses the base candle the level geometry is built from
pub trait FinalCandleSelector: Send + Sync {
    fn pick(&self, candles: &[Candle], direction: Direction) -> Option<Candle>;
}

/// Number of decimals prices of a symbol are rounded to
pub trait PricePrecision: Send + Sync {
    fn precision(&self, symbol: &str) -> u32;
}

/// Outbound channel for signals and zone transitions
#[async_trait]
pub trait SignalNotifier: Send + Sync {
    async fn notify_signal(&self, signal: &SignalContract) -> Result<()>;
    async fn notify_zone_event(&self, event: &ZoneEvent) -> Result<()>;
}
