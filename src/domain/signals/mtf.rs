use super::types::{Bias, MtfContext, TrendState};
use crate::domain::market::candle::Candle;

/// Candles fetched per higher timeframe
pub const MTF_FETCH_LIMIT: usize = 120;
/// Timeframes with fewer candles are ignored
pub const MTF_MIN_CANDLES: usize = 50;
/// Trailing candles counted for the directional bias
pub const MTF_BIAS_LOOKBACK: usize = 30;

/// Directional read of one timeframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeframeBias {
    pub bias: Bias,
    /// 0.0..=100.0
    pub strength: f64,
}

/// Counts bullish vs non-bullish closes over the last `MTF_BIAS_LOOKBACK` candles
pub fn analyze_tf_bias(candles: &[Candle]) -> TimeframeBias {
    let window = &candles[candles.len().saturating_sub(MTF_BIAS_LOOKBACK)..];
    let up = window.iter().filter(|c| c.close > c.open).count();
    let down = window.len() - up;
    let total = up + down;

    if total == 0 || up == down {
        return TimeframeBias {
            bias: Bias::Neutral,
            strength: 0.0,
        };
    }

    let strength = up.abs_diff(down) as f64 / total as f64 * 100.0;
    let bias = if up > down { Bias::Long } else { Bias::Short };
    TimeframeBias { bias, strength }
}

/// Majority vote over timeframe biases; strength is the truncated mean
pub fn merge_biases(reads: &[TimeframeBias]) -> MtfContext {
    if reads.is_empty() {
        return MtfContext::neutral();
    }

    let longs = reads.iter().filter(|r| r.bias == Bias::Long).count();
    let shorts = reads.iter().filter(|r| r.bias == Bias::Short).count();
    let bias = match longs.cmp(&shorts) {
        std::cmp::Ordering::Greater => Bias::Long,
        std::cmp::Ordering::Less => Bias::Short,
        std::cmp::Ordering::Equal => Bias::Neutral,
    };

    let mean = reads.iter().map(|r| r.strength).sum::<f64>() / reads.len() as f64;
    let strength = mean.clamp(0.0, 100.0) as u8;

    MtfContext {
        bias,
        strength,
        trend_state: TrendState::from_strength(strength),
    }
}
