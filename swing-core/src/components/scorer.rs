//! Scorer — weighted five-factor score with a per-factor breakdown.
//!
//! Each factor maps its inputs to a raw 0–100 sub-score; the final score is
//! the rounded sum of `raw * weight`, clamped to [0, 100]. Pure: the same
//! inputs always give the same breakdown.

use serde::{Deserialize, Serialize};

use super::reason::{reason, ReasonContext};
use super::signal::SignalKind;
use crate::config::{ScoreWeights, ScreenerConfig, ScoringParams};

/// The closed set of scoring factors, in breakdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    SignalCount,
    RiskReward,
    Volume,
    TrendStrength,
    RsiPosition,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::SignalCount,
        Factor::RiskReward,
        Factor::Volume,
        Factor::TrendStrength,
        Factor::RsiPosition,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SignalCount => "Signal Count",
            Self::RiskReward => "Risk / Reward",
            Self::Volume => "Volume",
            Self::TrendStrength => "Trend Strength",
            Self::RsiPosition => "RSI Position",
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, factor: Factor) -> f64 {
        match factor {
            Factor::SignalCount => self.signal_count,
            Factor::RiskReward => self.risk_reward,
            Factor::Volume => self.volume,
            Factor::TrendStrength => self.trend,
            Factor::RsiPosition => self.rsi,
        }
    }
}

/// Everything the scorer reads, gathered by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreInputs {
    pub active_signals: Vec<SignalKind>,
    pub risk_reward: f64,
    pub volume: f64,
    /// Average volume over the bars before the latest one.
    pub avg_volume: Option<f64>,
    pub close: f64,
    pub ema_short: f64,
    pub ema_mid: f64,
    pub ema_long: f64,
    pub rsi: f64,
}

impl ScoreInputs {
    pub fn volume_ratio(&self) -> Option<f64> {
        match self.avg_volume {
            Some(avg) if avg > 0.0 && self.volume.is_finite() => Some(self.volume / avg),
            _ => None,
        }
    }

    /// The four trend checks, in order: close > short, short > mid,
    /// mid > long, close > long.
    pub fn trend_checks(&self) -> [bool; 4] {
        [
            self.close > self.ema_short,
            self.ema_short > self.ema_mid,
            self.ema_mid > self.ema_long,
            self.close > self.ema_long,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub name: String,
    pub raw_score: f64,
    pub weight: f64,
    pub weighted: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub factors: Vec<FactorScore>,
}

impl ScoreBreakdown {
    /// Unrounded sum of weighted contributions.
    pub fn weighted_sum(&self) -> f64 {
        self.factors.iter().map(|f| f.weighted).sum()
    }

    /// Final 0–100 score.
    pub fn score(&self) -> u32 {
        self.weighted_sum().round().clamp(0.0, 100.0) as u32
    }

    pub fn get(&self, factor: Factor) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == factor)
    }
}

#[derive(Debug, Clone)]
pub struct Scorer {
    params: ScoringParams,
    context: ReasonContext,
}

impl Scorer {
    pub fn new(config: &ScreenerConfig) -> Self {
        let ind = &config.indicators;
        Self {
            params: config.scoring.clone(),
            context: ReasonContext {
                ema_periods: [ind.ema_short, ind.ema_mid, ind.ema_long],
                volume_period: ind.volume_avg_period,
                rr_ceiling: config.scoring.rr_ceiling,
                rsi_ideal: (config.scoring.rsi_ideal_low, config.scoring.rsi_ideal_high),
            },
        }
    }

    pub fn score(&self, inputs: &ScoreInputs) -> ScoreBreakdown {
        let factors = Factor::ALL
            .into_iter()
            .map(|factor| {
                let raw_score = self.raw_score(factor, inputs);
                let weight = self.params.weights.weight(factor);
                FactorScore {
                    factor,
                    name: factor.name().to_string(),
                    raw_score,
                    weight,
                    weighted: raw_score * weight,
                    reason: reason(factor, inputs, &self.context),
                }
            })
            .collect();
        ScoreBreakdown { factors }
    }

    pub fn raw_score(&self, factor: Factor, inputs: &ScoreInputs) -> f64 {
        let raw = match factor {
            Factor::SignalCount => {
                inputs.active_signals.len() as f64 / SignalKind::ALL.len() as f64 * 100.0
            }
            Factor::RiskReward => {
                if inputs.risk_reward.is_nan() {
                    0.0
                } else {
                    (inputs.risk_reward / self.params.rr_ceiling).min(1.0) * 100.0
                }
            }
            Factor::Volume => match inputs.volume_ratio() {
                Some(ratio) => {
                    let cap = self.params.volume_ratio_cap;
                    ratio.min(cap) / cap * 100.0
                }
                None => 0.0,
            },
            Factor::TrendStrength => {
                inputs.trend_checks().iter().filter(|ok| **ok).count() as f64 * 25.0
            }
            Factor::RsiPosition => self.rsi_score(inputs.rsi),
        };
        raw.clamp(0.0, 100.0)
    }

    fn rsi_score(&self, rsi: f64) -> f64 {
        let p = &self.params;
        if rsi.is_nan() {
            0.0
        } else if rsi < p.rsi_ideal_low {
            (rsi - p.rsi_floor) / (p.rsi_ideal_low - p.rsi_floor) * 100.0
        } else if rsi > p.rsi_ideal_high {
            (p.rsi_ceiling - rsi) / (p.rsi_ceiling - p.rsi_ideal_high) * 100.0
        } else {
            100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn inputs() -> ScoreInputs {
        ScoreInputs {
            active_signals: vec![SignalKind::EmaAligned, SignalKind::RsiRecovery],
            risk_reward: 2.0,
            volume: 170_000.0,
            avg_volume: Some(100_000.0),
            close: 105.0,
            ema_short: 100.0,
            ema_mid: 95.0,
            ema_long: 90.0,
            rsi: 45.0,
        }
    }

    fn scorer() -> Scorer {
        Scorer::new(&ScreenerConfig::default())
    }

    #[test]
    fn breakdown_has_five_factors_in_order() {
        let breakdown = scorer().score(&inputs());
        let order: Vec<Factor> = breakdown.factors.iter().map(|f| f.factor).collect();
        assert_eq!(order, Factor::ALL.to_vec());
    }

    #[test]
    fn raw_scores() {
        let b = scorer().score(&inputs());
        assert_approx(b.get(Factor::SignalCount).unwrap().raw_score, 40.0, 1e-9);
        assert_approx(b.get(Factor::RiskReward).unwrap().raw_score, 50.0, 1e-9);
        assert_approx(b.get(Factor::Volume).unwrap().raw_score, 85.0, 1e-9);
        assert_approx(b.get(Factor::TrendStrength).unwrap().raw_score, 100.0, 1e-9);
        assert_approx(b.get(Factor::RsiPosition).unwrap().raw_score, 100.0, 1e-9);
    }

    #[test]
    fn final_score_is_rounded_weighted_sum() {
        // 0.30*40 + 0.25*50 + 0.15*85 + 0.15*100 + 0.15*100 = 67.25
        let b = scorer().score(&inputs());
        assert_approx(b.weighted_sum(), 67.25, 1e-9);
        assert_eq!(b.score(), 67);
    }

    #[test]
    fn rr_saturates_at_ceiling() {
        let mut i = inputs();
        i.risk_reward = 9.0;
        assert_approx(scorer().raw_score(Factor::RiskReward, &i), 100.0, 1e-9);
    }

    #[test]
    fn volume_without_average_scores_zero() {
        let mut i = inputs();
        i.avg_volume = None;
        assert_eq!(scorer().raw_score(Factor::Volume, &i), 0.0);
        i.avg_volume = Some(0.0);
        assert_eq!(scorer().raw_score(Factor::Volume, &i), 0.0);
    }

    #[test]
    fn volume_ratio_is_capped() {
        let mut i = inputs();
        i.volume = 1_000_000.0;
        assert_approx(scorer().raw_score(Factor::Volume, &i), 100.0, 1e-9);
    }

    #[test]
    fn trend_counts_quarters() {
        let mut i = inputs();
        i.ema_short = 110.0; // close < short and short > mid
        assert_approx(scorer().raw_score(Factor::TrendStrength, &i), 75.0, 1e-9);
        i.ema_long = f64::NAN;
        assert_approx(scorer().raw_score(Factor::TrendStrength, &i), 25.0, 1e-9);
    }

    #[test]
    fn rsi_curve() {
        let s = scorer();
        let at = |rsi: f64| {
            let mut i = inputs();
            i.rsi = rsi;
            s.raw_score(Factor::RsiPosition, &i)
        };
        assert_approx(at(40.0), 100.0, 1e-9);
        assert_approx(at(60.0), 100.0, 1e-9);
        assert_approx(at(25.0), 50.0, 1e-9);
        assert_approx(at(75.0), 50.0, 1e-9);
        assert_eq!(at(10.0), 0.0);
        assert_eq!(at(5.0), 0.0);
        assert_eq!(at(95.0), 0.0);
        assert_eq!(at(f64::NAN), 0.0);
    }

    #[test]
    fn weights_are_attached() {
        let b = scorer().score(&inputs());
        let sum: f64 = b.factors.iter().map(|f| f.weight).sum();
        assert_approx(sum, 1.0, 1e-9);
        for f in &b.factors {
            assert_approx(f.weighted, f.raw_score * f.weight, 1e-12);
            assert!(!f.reason.is_empty());
        }
    }
}
