//! Liquidity range structure gate.
//!
//! The higher-timeframe range is the highest high / lowest low of the gate
//! candles before the latest one. The latest close is located against that range:
//!
//! ```text
//!  high ──────────────  ┐
//!        EDGE           │ edge_fraction * width
//!  ─────────────────── ─┘
//!        INSIDE
//!  ─────────────────── ─┐
//!        EDGE           │ edge_fraction * width
//!  low  ──────────────  ┘
//! ```
//!
//! Anything beyond the range is `OTHER`. The bias follows the side of the range
//! midpoint the close sits on.

use crate::domain::errors::GateError;
use crate::domain::market::candle::Candle;
use crate::domain::market::timeframe::Timeframe;
use crate::domain::ports::{CandleSource, StructureGate};
use crate::domain::signals::types::{Bias, GateContext, GatePosition};
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct LiquidityRangeConfig {
    pub timeframe: Timeframe,
    pub lookback: usize,
    /// Share of the range width, measured from each boundary, that counts as edge
    pub edge_fraction: f64,
}

impl Default for LiquidityRangeConfig {
    fn default() -> Self {
        Self {
            timeframe: Timeframe::FourHour,
            lookback: 60,
            edge_fraction: 0.2,
        }
    }
}

/// Locates the last close of `candles` in the high/low range of the bars before it.
///
/// `None` without at least one prior bar.
pub fn classify_range(candles: &[Candle], edge_fraction: f64) -> Option<GateContext> {
    let (last, prior) = candles.split_last()?;
    let high = prior.iter().map(|c| c.high).max()?;
    let low = prior.iter().map(|c| c.low).min()?;
    let width = high - low;

    if width <= Decimal::ZERO {
        return Some(GateContext::closed());
    }

    let edge = width * Decimal::from_f64(edge_fraction).unwrap_or_default();
    let close = last.close;
    let position = if close < low || close > high {
        GatePosition::Other
    } else if close < low + edge || close > high - edge {
        GatePosition::Edge
    } else {
        GatePosition::Inside
    };

    let midpoint = (high + low) / Decimal::TWO;
    let bias = match close.cmp(&midpoint) {
        std::cmp::Ordering::Greater => Bias::Long,
        std::cmp::Ordering::Less => Bias::Short,
        std::cmp::Ordering::Equal => Bias::Neutral,
    };

    Some(GateContext {
        pass: true,
        position,
        bias,
    })
}

pub struct LiquidityRangeGate {
    source: Arc<dyn CandleSource>,
    config: LiquidityRangeConfig,
}

impl LiquidityRangeGate {
    pub fn new(source: Arc<dyn CandleSource>, config: LiquidityRangeConfig) -> Self {
        Self { source, config }
    }
}

#[async_trait]
impl StructureGate for LiquidityRangeGate {
    async fn check(&self, symbol: &str) -> Result<GateContext> {
        let batch = self
            .source
            .fetch(symbol, self.config.timeframe, self.config.lookback)
            .await
            .map_err(|e| GateError::Unavailable {
                symbol: symbol.to_string(),
                reason: format!("{:#}", e),
            })?;

        // a range needs at least two bars to say anything about the last close
        let needed = self.config.lookback.max(2);
        if batch.candles.len() < needed {
            return Err(GateError::InsufficientData {
                symbol: symbol.to_string(),
                needed,
                available: batch.candles.len(),
            }
            .into());
        }

        let context = classify_range(&batch.candles, self.config.edge_fraction)
            .unwrap_or_else(GateContext::closed);
        debug!(
            "LiquidityRangeGate [{}/{}]: pass={} position={} bias={}",
            symbol, self.config.timeframe, context.pass, context.position, context.bias
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::candle::CandleBatch;
    use rust_decimal_macros::dec;

    fn bar(ts: i64, high: Decimal, low: Decimal, close: Decimal) -> Candle {
        Candle::new(ts, close, high, low, close)
    }

    /// Range 100..200 with the last bar closing at `close`
    fn range_with_close(close: Decimal) -> Vec<Candle> {
        vec![
            bar(0, dec!(200), dec!(150), dec!(180)),
            bar(1, dec!(160), dec!(100), dec!(120)),
            bar(2, close, close, close),
        ]
    }

    #[test]
    fn test_inside_edge_and_bias() {
        let inside = classify_range(&range_with_close(dec!(130)), 0.2).unwrap();
        assert!(inside.pass);
        assert_eq!(inside.position, GatePosition::Inside);
        assert_eq!(inside.bias, Bias::Short);

        let upper_edge = classify_range(&range_with_close(dec!(190)), 0.2).unwrap();
        assert_eq!(upper_edge.position, GatePosition::Edge);
        assert_eq!(upper_edge.bias, Bias::Long);

        let lower_edge = classify_range(&range_with_close(dec!(105)), 0.2).unwrap();
        assert_eq!(lower_edge.position, GatePosition::Edge);
        assert_eq!(lower_edge.bias, Bias::Short);

        let middle = classify_range(&range_with_close(dec!(150)), 0.2).unwrap();
        assert_eq!(middle.position, GatePosition::Inside);
        assert_eq!(middle.bias, Bias::Neutral);
    }

    #[test]
    fn test_breakout_close_is_other() {
        let mut candles: Vec<Candle> = (0..59)
            .map(|i| bar(i, dec!(110), dec!(90), if i % 2 == 0 { dec!(95) } else { dec!(105) }))
            .collect();
        candles.push(Candle::new(59, dec!(108), dec!(150), dec!(107), dec!(148)));

        let ctx = classify_range(&candles, 0.2).unwrap();
        assert_eq!(ctx.position, GatePosition::Other);
        assert_eq!(ctx.bias, Bias::Long);

        let last = candles.len() - 1;
        candles[last] = Candle::new(59, dec!(92), dec!(93), dec!(70), dec!(72));
        assert_eq!(classify_range(&candles, 0.2).unwrap().position, GatePosition::Other);
    }

    #[test]
    fn test_flat_range_does_not_pass() {
        let flat = vec![bar(0, dec!(5), dec!(5), dec!(5)), bar(1, dec!(5), dec!(5), dec!(5))];
        let ctx = classify_range(&flat, 0.2).unwrap();
        assert!(!ctx.pass);
        assert!(classify_range(&[], 0.2).is_none());
        assert!(classify_range(&flat[..1], 0.2).is_none());
    }

    struct FixedSource(Vec<Candle>);

    #[async_trait]
    impl CandleSource for FixedSource {
        async fn fetch(&self, _: &str, _: Timeframe, limit: usize) -> Result<CandleBatch> {
            let start = self.0.len().saturating_sub(limit);
            Ok(CandleBatch::live(self.0[start..].to_vec()))
        }
    }

    #[tokio::test]
    async fn test_gate_requires_lookback() {
        let config = LiquidityRangeConfig {
            lookback: 3,
            ..LiquidityRangeConfig::default()
        };
        let gate = LiquidityRangeGate::new(Arc::new(FixedSource(range_with_close(dec!(190)))), config.clone());
        let ctx = gate.check("INJUSDT").await.unwrap();
        assert_eq!(ctx.position, GatePosition::Edge);

        let short = LiquidityRangeGate::new(
            Arc::new(FixedSource(range_with_close(dec!(190))[..2].to_vec())),
            config,
        );
        let err = short.check("INJUSDT").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::InsufficientData { available: 2, .. })
        ));
    }
}
