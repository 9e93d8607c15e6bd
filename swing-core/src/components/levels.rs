//! Level calculator — entry, stop-loss and profit targets.
//!
//! Entry is the latest close. The stop is the tighter (higher) of an ATR
//! stop and a buffered stop under the nearest support below entry. The
//! primary target sits at the minimum reward multiple of the risk; optional
//! secondary targets follow at larger multiples and at the next resistance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LevelParams;
use crate::indicators::PriceLevels;

/// Minimum gap between two targets before they count as the same price.
const TARGET_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LevelError {
    #[error("levels are indeterminate: {reason}")]
    Indeterminate { reason: &'static str },
}

/// Suggested trade levels for a long swing position.
///
/// Invariant: `stop_loss < entry < targets[0]`, targets ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub targets: Vec<f64>,
    /// entry - stop_loss
    pub risk: f64,
    /// primary target - entry
    pub reward: f64,
    pub risk_reward: f64,
}

impl TradeLevels {
    pub fn primary_target(&self) -> f64 {
        self.targets[0]
    }

    /// Copy with prices and ratio rounded to cents for display.
    ///
    /// Targets that meet at the same cent collapse into one.
    pub fn rounded(&self) -> Self {
        let mut targets: Vec<f64> = self.targets.iter().map(|t| round2(*t)).collect();
        targets.dedup();
        Self {
            entry: round2(self.entry),
            stop_loss: round2(self.stop_loss),
            targets,
            risk: round2(self.risk),
            reward: round2(self.reward),
            risk_reward: round2(self.risk_reward),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct LevelCalculator {
    params: LevelParams,
}

impl LevelCalculator {
    pub fn new(params: &LevelParams) -> Self {
        Self {
            params: params.clone(),
        }
    }

    pub fn calculate(&self, close: f64, atr: f64, levels: &PriceLevels) -> Result<TradeLevels, LevelError> {
        if !(close.is_finite() && close > 0.0) {
            return Err(LevelError::Indeterminate {
                reason: "no usable close",
            });
        }
        if !(atr.is_finite() && atr > 0.0) {
            return Err(LevelError::Indeterminate {
                reason: "ATR is zero or undefined",
            });
        }

        let entry = close;
        let atr_stop = entry - self.params.atr_stop_multiplier * atr;
        let stop_loss = match levels.support_below(entry) {
            Some(support) => atr_stop.max(support * (1.0 - self.params.support_stop_buffer_pct)),
            None => atr_stop,
        };

        let risk = entry - stop_loss;
        if risk <= 0.0 {
            return Err(LevelError::Indeterminate {
                reason: "stop is not below entry",
            });
        }
        if stop_loss <= 0.0 {
            return Err(LevelError::Indeterminate {
                reason: "stop falls below zero",
            });
        }

        let primary = entry + risk * self.params.min_risk_reward;
        // Candidates carry cent prices; the ordering must survive rounding.
        if !(round2(stop_loss) < round2(entry) && round2(entry) < round2(primary)) {
            return Err(LevelError::Indeterminate {
                reason: "levels collapse at cent precision",
            });
        }
        let mut targets = vec![primary];
        targets.extend(
            self.params
                .extra_target_multiples
                .iter()
                .map(|m| entry + risk * m),
        );
        if self.params.resistance_target {
            if let Some(resistance) = levels.resistance_above(primary) {
                targets.push(resistance);
            }
        }
        targets.retain(|t| *t >= primary);
        targets.sort_by(|a, b| a.total_cmp(b));
        targets.dedup_by(|a, b| (*a - *b).abs() < TARGET_EPSILON);

        let reward = primary - entry;
        Ok(TradeLevels {
            entry,
            stop_loss,
            targets,
            risk,
            reward,
            risk_reward: reward / risk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn calculator() -> LevelCalculator {
        LevelCalculator::new(&LevelParams::default())
    }

    fn supports(levels: &[f64]) -> PriceLevels {
        PriceLevels {
            supports: levels.to_vec(),
            resistances: vec![],
        }
    }

    #[test]
    fn support_stop_tighter_than_atr_stop() {
        // ATR stop 94.0, support stop 97 * 0.98 = 95.06
        let levels = calculator().calculate(100.0, 4.0, &supports(&[97.0])).unwrap();
        assert_approx(levels.stop_loss, 95.06, 1e-9);
        assert_approx(levels.primary_target(), 109.88, 1e-9);
        assert_approx(levels.risk_reward, 2.0, 1e-9);

        let shown = levels.rounded();
        assert_eq!(shown.stop_loss, 95.06);
        assert_eq!(shown.primary_target(), 109.88);
        assert_eq!(shown.risk_reward, 2.0);
    }

    #[test]
    fn atr_stop_without_support() {
        let levels = calculator().calculate(100.0, 4.0, &PriceLevels::default()).unwrap();
        assert_approx(levels.stop_loss, 94.0, 1e-9);
        assert_approx(levels.primary_target(), 112.0, 1e-9);
        assert_approx(levels.targets[1], 118.0, 1e-9);
    }

    #[test]
    fn far_support_leaves_atr_stop() {
        let levels = calculator().calculate(100.0, 4.0, &supports(&[80.0])).unwrap();
        assert_approx(levels.stop_loss, 94.0, 1e-9);
    }

    #[test]
    fn support_at_entry_is_not_below_it() {
        let levels = calculator().calculate(100.0, 4.0, &supports(&[100.0])).unwrap();
        assert_approx(levels.stop_loss, 94.0, 1e-9);
    }

    #[test]
    fn resistance_target_added_above_primary() {
        let levels = PriceLevels {
            supports: vec![],
            resistances: vec![105.0, 115.0, 130.0],
        };
        let result = calculator().calculate(100.0, 4.0, &levels).unwrap();
        // primary 112, 3R = 118, resistance above 112 = 115
        assert_eq!(result.targets.len(), 3);
        assert_approx(result.targets[0], 112.0, 1e-9);
        assert_approx(result.targets[1], 115.0, 1e-9);
        assert_approx(result.targets[2], 118.0, 1e-9);
    }

    #[test]
    fn duplicate_targets_collapse() {
        let levels = PriceLevels {
            supports: vec![],
            resistances: vec![118.0],
        };
        let result = calculator().calculate(100.0, 4.0, &levels).unwrap();
        assert_eq!(result.targets.len(), 2);
    }

    #[test]
    fn zero_atr_is_indeterminate() {
        assert!(matches!(
            calculator().calculate(100.0, 0.0, &PriceLevels::default()),
            Err(LevelError::Indeterminate { .. })
        ));
    }

    #[test]
    fn nan_inputs_are_indeterminate() {
        assert!(calculator().calculate(f64::NAN, 2.0, &PriceLevels::default()).is_err());
        assert!(calculator().calculate(100.0, f64::NAN, &PriceLevels::default()).is_err());
    }

    #[test]
    fn stop_below_zero_is_indeterminate() {
        assert!(calculator().calculate(10.0, 8.0, &PriceLevels::default()).is_err());
    }

    #[test]
    fn sub_cent_risk_is_indeterminate() {
        // ATR stop 49.997 rounds to the entry price
        let err = calculator()
            .calculate(50.0, 0.002, &PriceLevels::default())
            .unwrap_err();
        assert_eq!(
            err,
            LevelError::Indeterminate {
                reason: "levels collapse at cent precision"
            }
        );
    }

    #[test]
    fn rounded_levels_keep_ordering() {
        // risk 0.006: stop 49.99, primary 50.01 after rounding
        let levels = calculator()
            .calculate(50.0, 0.004, &PriceLevels::default())
            .unwrap()
            .rounded();
        assert!(levels.stop_loss < levels.entry);
        assert!(levels.entry < levels.primary_target());
        assert!(levels.targets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn invariant_holds() {
        let levels = calculator()
            .calculate(57.3, 1.7, &supports(&[50.0, 55.9, 57.0]))
            .unwrap();
        assert!(levels.stop_loss < levels.entry);
        assert!(levels.entry < levels.primary_target());
        assert!(levels.targets.windows(2).all(|w| w[0] < w[1]));
    }
}
