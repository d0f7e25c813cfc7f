use super::types::{Bias, Confidence, GateContext, GatePosition, MtfContext, ScoreResult, StfSnapshot};
use serde::{Deserialize, Serialize};

/// Weights and thresholds of the additive score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub inside_points: i32,
    pub edge_points: i32,
    pub strong_impulse_pct: f64,
    pub strong_impulse_points: i32,
    pub medium_impulse_pct: f64,
    pub medium_impulse_points: i32,
    pub weak_impulse_points: i32,
    /// Volatility must exceed `impulse_pct * volatility_ratio` for the bonus
    pub volatility_ratio: f64,
    pub volatility_points: i32,
    pub mtf_aligned_cap: i32,
    /// MTF strength is divided by this before capping
    pub mtf_strength_divisor: i32,
    pub mtf_neutral_points: i32,
    pub mtf_opposed_penalty: i32,
    pub pass_threshold: i32,
    pub high_confidence: i32,
    pub mid_confidence: i32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            inside_points: 30,
            edge_points: 15,
            strong_impulse_pct: 0.025,
            strong_impulse_points: 25,
            medium_impulse_pct: 0.018,
            medium_impulse_points: 15,
            weak_impulse_points: 5,
            volatility_ratio: 1.1,
            volatility_points: 10,
            mtf_aligned_cap: 20,
            mtf_strength_divisor: 3,
            mtf_neutral_points: 5,
            mtf_opposed_penalty: 10,
            pass_threshold: 55,
            high_confidence: 80,
            mid_confidence: 65,
        }
    }
}

impl ScoringConfig {
    pub fn confidence(&self, score: i32) -> Confidence {
        if score >= self.high_confidence {
            Confidence::High
        } else if score >= self.mid_confidence {
            Confidence::Mid
        } else {
            Confidence::Low
        }
    }
}

/// Additive score over gate, impulse, volatility and MTF alignment.
///
/// The gate decides both eligibility and direction; MTF only adjusts the score.
pub fn run_scoring(
    snapshot: &StfSnapshot,
    gate: &GateContext,
    mtf: &MtfContext,
    config: &ScoringConfig,
) -> ScoreResult {
    let mut score = match gate.position {
        GatePosition::Inside => config.inside_points,
        GatePosition::Edge => config.edge_points,
        GatePosition::Other => return ScoreResult::fail(),
    };

    let Some(direction) = gate.bias.direction() else {
        return ScoreResult::fail();
    };

    score += if snapshot.impulse_pct >= config.strong_impulse_pct {
        config.strong_impulse_points
    } else if snapshot.impulse_pct >= config.medium_impulse_pct {
        config.medium_impulse_points
    } else {
        config.weak_impulse_points
    };

    if snapshot.volatility > snapshot.impulse_pct * config.volatility_ratio {
        score += config.volatility_points;
    }

    score += match mtf.bias {
        Bias::Neutral => config.mtf_neutral_points,
        bias if bias == Bias::from(direction) => {
            let divisor = config.mtf_strength_divisor.max(1);
            (i32::from(mtf.strength) / divisor).min(config.mtf_aligned_cap)
        }
        _ => -config.mtf_opposed_penalty,
    };

    if score < config.pass_threshold {
        return ScoreResult::fail();
    }

    ScoreResult {
        pass: true,
        score,
        direction: Some(direction),
        confidence: config.confidence(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::candle::DataHealth;
    use crate::domain::signals::types::{Direction, TrendState};

    fn snapshot(impulse_pct: f64, volatility: f64) -> StfSnapshot {
        StfSnapshot {
            candle_count: 200,
            impulse_pct,
            range_pct: 0.1,
            volatility,
            candles: Vec::new(),
            health: DataHealth::Live,
        }
    }

    fn gate(position: GatePosition, bias: Bias) -> GateContext {
        GateContext { pass: true, position, bias }
    }

    fn mtf(bias: Bias, strength: u8) -> MtfContext {
        MtfContext {
            bias,
            strength,
            trend_state: TrendState::from_strength(strength),
        }
    }

    #[test]
    fn test_gate_other_fails() {
        let result = run_scoring(
            &snapshot(0.05, 0.1),
            &gate(GatePosition::Other, Bias::Long),
            &mtf(Bias::Long, 90),
            &ScoringConfig::default(),
        );
        assert_eq!(result, ScoreResult::fail());
    }

    #[test]
    fn test_neutral_gate_bias_fails() {
        let result = run_scoring(
            &snapshot(0.05, 0.1),
            &gate(GatePosition::Inside, Bias::Neutral),
            &mtf(Bias::Long, 90),
            &ScoringConfig::default(),
        );
        assert!(!result.pass);
        assert_eq!(result.direction, None);
    }

    #[test]
    fn test_full_alignment_scores_high() {
        // 30 inside + 25 strong impulse + 10 volatility + min(20, 90 / 3)
        let result = run_scoring(
            &snapshot(0.03, 0.04),
            &gate(GatePosition::Inside, Bias::Short),
            &mtf(Bias::Short, 90),
            &ScoringConfig::default(),
        );
        assert!(result.pass);
        assert_eq!(result.score, 85);
        assert_eq!(result.direction, Some(Direction::Short));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn test_mtf_strength_uses_integer_division() {
        // 30 + 15 + 0 + 50 / 3 = 61
        let result = run_scoring(
            &snapshot(0.02, 0.0),
            &gate(GatePosition::Inside, Bias::Long),
            &mtf(Bias::Long, 50),
            &ScoringConfig::default(),
        );
        assert_eq!(result.score, 61);
        assert_eq!(result.confidence, Confidence::Low);
    }

    #[test]
    fn test_opposed_mtf_can_sink_score() {
        // 30 + 25 + 10 - 10 = 55 passes, edge position drops it below
        let config = ScoringConfig::default();
        let inside = run_scoring(
            &snapshot(0.03, 0.04),
            &gate(GatePosition::Inside, Bias::Long),
            &mtf(Bias::Short, 80),
            &config,
        );
        assert!(inside.pass);
        assert_eq!(inside.score, 55);

        let edge = run_scoring(
            &snapshot(0.03, 0.04),
            &gate(GatePosition::Edge, Bias::Long),
            &mtf(Bias::Short, 80),
            &config,
        );
        assert!(!edge.pass);
        assert_eq!(edge.score, 0);
    }

    #[test]
    fn test_neutral_mtf_bonus() {
        // 30 + 25 + 0 + 5
        let result = run_scoring(
            &snapshot(0.03, 0.0),
            &gate(GatePosition::Inside, Bias::Long),
            &MtfContext::neutral(),
            &ScoringConfig::default(),
        );
        assert_eq!(result.score, 60);
        assert_eq!(result.confidence, Confidence::Low);
    }
}
