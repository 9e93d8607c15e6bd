//! Screener configuration — one immutable value handed to every component.
//!
//! Every field has a default matching the reference screener, so a TOML file
//! only needs to list what it overrides:
//!
//! ```toml
//! [filters]
//! min_price = 5.0
//!
//! [scoring.weights]
//! signal_count = 0.40
//! risk_reward = 0.15
//! ```
//!
//! `validate()` runs once before any scan; a config that fails it never
//! reaches a component.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance on the weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Fatal configuration problems. Any of these prevents a scan from starting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("scoring weights sum to {sum:.6}, expected 1.0")]
    WeightsDoNotSumToOne { sum: f64 },

    #[error("scoring weight '{name}' = {value} is outside [0, 1]")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("invalid threshold '{name}': {reason}")]
    InvalidThreshold { name: &'static str, reason: String },

    #[error("invalid period '{name}': {reason}")]
    InvalidPeriod { name: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Complete screener configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub indicators: IndicatorParams,
    pub filters: FilterParams,
    pub signals: SignalParams,
    pub levels: LevelParams,
    pub scoring: ScoringParams,
    /// Minimum number of bars a series needs before it is evaluated.
    pub min_history: usize,
    /// Number of trailing closes carried on each candidate.
    pub sparkline_len: usize,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            filters: FilterParams::default(),
            signals: SignalParams::default(),
            levels: LevelParams::default(),
            scoring: ScoringParams::default(),
            min_history: 200,
            sparkline_len: 30,
        }
    }
}

/// Indicator periods and support/resistance detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub ema_short: usize,
    pub ema_mid: usize,
    pub ema_long: usize,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    pub volume_avg_period: usize,
    /// Bars scanned for swing highs/lows.
    pub sr_lookback: usize,
    /// Bars on each side a swing point must dominate.
    pub sr_swing_window: usize,
    /// Relative distance under which neighbouring levels merge.
    pub sr_cluster_tolerance: f64,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_short: 20,
            ema_mid: 50,
            ema_long: 200,
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
            volume_avg_period: 20,
            sr_lookback: 60,
            sr_swing_window: 5,
            sr_cluster_tolerance: 0.015,
        }
    }
}

/// Filter gate thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Minimum trailing average daily volume, in shares.
    pub min_avg_volume: f64,
    /// Minimum latest close.
    pub min_price: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_avg_volume: 100_000.0,
            min_price: 50.0,
        }
    }
}

/// Signal detector thresholds and the qualification minimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalParams {
    pub rsi_oversold: f64,
    /// Bars (latest included) searched for an oversold RSI reading.
    pub rsi_recovery_lookback: usize,
    /// Bars (latest included) searched for a MACD crossover.
    pub macd_crossover_lookback: usize,
    /// Maximum relative distance above support for a bounce.
    pub support_proximity_pct: f64,
    pub volume_surge_factor: f64,
    /// Signals required for a candidate to qualify.
    pub min_signals: usize,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            rsi_oversold: 40.0,
            rsi_recovery_lookback: 5,
            macd_crossover_lookback: 3,
            support_proximity_pct: 0.02,
            volume_surge_factor: 1.5,
            min_signals: 2,
        }
    }
}

/// Trade level derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelParams {
    pub atr_stop_multiplier: f64,
    pub min_risk_reward: f64,
    /// Stop floor sits this fraction below the nearest support.
    pub support_stop_buffer_pct: f64,
    /// Additional R-multiples for secondary targets (must exceed `min_risk_reward`).
    pub extra_target_multiples: Vec<f64>,
    /// Add the nearest resistance above the primary target as a target.
    pub resistance_target: bool,
}

impl Default for LevelParams {
    fn default() -> Self {
        Self {
            atr_stop_multiplier: 1.5,
            min_risk_reward: 2.0,
            support_stop_buffer_pct: 0.02,
            extra_target_multiples: vec![3.0],
            resistance_target: true,
        }
    }
}

/// Factor weights for the composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub signal_count: f64,
    pub risk_reward: f64,
    pub volume: f64,
    pub trend: f64,
    pub rsi: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            signal_count: 0.30,
            risk_reward: 0.25,
            volume: 0.15,
            trend: 0.15,
            rsi: 0.15,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.signal_count + self.risk_reward + self.volume + self.trend + self.rsi
    }

    fn named(&self) -> [(&'static str, f64); 5] {
        [
            ("signal_count", self.signal_count),
            ("risk_reward", self.risk_reward),
            ("volume", self.volume),
            ("trend", self.trend),
            ("rsi", self.rsi),
        ]
    }
}

/// Scoring curve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub weights: ScoreWeights,
    /// R:R treated as a perfect score.
    pub rr_ceiling: f64,
    /// Volume ratio treated as a perfect score.
    pub volume_ratio_cap: f64,
    pub rsi_ideal_low: f64,
    pub rsi_ideal_high: f64,
    /// RSI at or below this scores zero.
    pub rsi_floor: f64,
    /// RSI at or above this scores zero.
    pub rsi_ceiling: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            rr_ceiling: 4.0,
            volume_ratio_cap: 2.0,
            rsi_ideal_low: 40.0,
            rsi_ideal_high: 60.0,
            rsi_floor: 10.0,
            rsi_ceiling: 90.0,
        }
    }
}

impl ScreenerConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Content hash of this configuration (BLAKE3 over its JSON form).
    ///
    /// Two configs with the same fingerprint produce identical scans on
    /// identical data.
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_vec(self).expect("ScreenerConfig serialization failed");
        blake3::hash(&json).to_hex().to_string()
    }

    /// Copy of this config with a different minimum price.
    pub fn with_min_price(&self, min_price: f64) -> Self {
        let mut config = self.clone();
        config.filters.min_price = min_price;
        config
    }

    /// Check every invariant the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_weights()?;
        self.validate_periods()?;
        self.validate_thresholds()
    }

    fn validate_weights(&self) -> Result<(), ConfigError> {
        let weights = &self.scoring.weights;
        for (name, value) in weights.named() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        let sum = weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightsDoNotSumToOne { sum });
        }
        Ok(())
    }

    fn validate_periods(&self) -> Result<(), ConfigError> {
        let ind = &self.indicators;
        let periods = [
            ("ema_short", ind.ema_short),
            ("ema_mid", ind.ema_mid),
            ("ema_long", ind.ema_long),
            ("rsi_period", ind.rsi_period),
            ("macd_fast", ind.macd_fast),
            ("macd_slow", ind.macd_slow),
            ("macd_signal", ind.macd_signal),
            ("atr_period", ind.atr_period),
            ("volume_avg_period", ind.volume_avg_period),
            ("sr_lookback", ind.sr_lookback),
            ("sr_swing_window", ind.sr_swing_window),
            ("rsi_recovery_lookback", self.signals.rsi_recovery_lookback),
            ("macd_crossover_lookback", self.signals.macd_crossover_lookback),
        ];
        for (name, period) in periods {
            if period == 0 {
                return Err(ConfigError::InvalidPeriod {
                    name,
                    reason: "must be >= 1".into(),
                });
            }
        }
        if !(ind.ema_short < ind.ema_mid && ind.ema_mid < ind.ema_long) {
            return Err(ConfigError::InvalidPeriod {
                name: "ema_short/ema_mid/ema_long",
                reason: format!(
                    "must be strictly increasing, got {}/{}/{}",
                    ind.ema_short, ind.ema_mid, ind.ema_long
                ),
            });
        }
        if ind.macd_fast >= ind.macd_slow {
            return Err(ConfigError::InvalidPeriod {
                name: "macd_fast",
                reason: format!("must be below macd_slow ({})", ind.macd_slow),
            });
        }
        if self.min_history < ind.ema_long {
            return Err(ConfigError::InvalidPeriod {
                name: "min_history",
                reason: format!(
                    "{} bars cannot warm up ema_long ({})",
                    self.min_history, ind.ema_long
                ),
            });
        }
        Ok(())
    }

    fn validate_thresholds(&self) -> Result<(), ConfigError> {
        let positive = [
            ("atr_stop_multiplier", self.levels.atr_stop_multiplier),
            ("min_risk_reward", self.levels.min_risk_reward),
            ("volume_surge_factor", self.signals.volume_surge_factor),
            ("rr_ceiling", self.scoring.rr_ceiling),
            ("volume_ratio_cap", self.scoring.volume_ratio_cap),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        let fractions = [
            ("support_proximity_pct", self.signals.support_proximity_pct),
            ("support_stop_buffer_pct", self.levels.support_stop_buffer_pct),
            ("sr_cluster_tolerance", self.indicators.sr_cluster_tolerance),
        ];
        for (name, value) in fractions {
            if !(0.0..1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold {
                    name,
                    reason: format!("must be in [0, 1), got {value}"),
                });
            }
        }

        if self.filters.min_price < 0.0 || self.filters.min_avg_volume < 0.0 {
            return Err(ConfigError::InvalidThreshold {
                name: "filters",
                reason: "minimums must be non-negative".into(),
            });
        }
        if !(0.0..=100.0).contains(&self.signals.rsi_oversold) {
            return Err(ConfigError::InvalidThreshold {
                name: "rsi_oversold",
                reason: format!("must be in [0, 100], got {}", self.signals.rsi_oversold),
            });
        }
        if self.signals.min_signals > crate::components::SignalKind::ALL.len() {
            return Err(ConfigError::InvalidThreshold {
                name: "min_signals",
                reason: format!(
                    "{} exceeds the {} available signals",
                    self.signals.min_signals,
                    crate::components::SignalKind::ALL.len()
                ),
            });
        }
        if let Some(m) = self
            .levels
            .extra_target_multiples
            .iter()
            .find(|m| !(m.is_finite() && **m > self.levels.min_risk_reward))
        {
            return Err(ConfigError::InvalidThreshold {
                name: "extra_target_multiples",
                reason: format!(
                    "{m} must exceed min_risk_reward ({})",
                    self.levels.min_risk_reward
                ),
            });
        }

        let s = &self.scoring;
        if !(s.rsi_floor < s.rsi_ideal_low
            && s.rsi_ideal_low <= s.rsi_ideal_high
            && s.rsi_ideal_high < s.rsi_ceiling)
        {
            return Err(ConfigError::InvalidThreshold {
                name: "rsi scoring band",
                reason: format!(
                    "need floor < ideal_low <= ideal_high < ceiling, got {}/{}/{}/{}",
                    s.rsi_floor, s.rsi_ideal_low, s.rsi_ideal_high, s.rsi_ceiling
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ScreenerConfig::default().validate().unwrap();
    }

    #[test]
    fn default_weights_sum_to_one() {
        let sum = ScoreWeights::default().sum();
        assert!((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn rejects_weights_not_summing_to_one() {
        let mut config = ScreenerConfig::default();
        config.scoring.weights.volume = 0.20;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WeightsDoNotSumToOne { .. })
        ));
    }

    #[test]
    fn rejects_negative_weight() {
        let mut config = ScreenerConfig::default();
        config.scoring.weights.volume = -0.15;
        config.scoring.weights.signal_count = 0.60;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWeight { name: "volume", .. })
        ));
    }

    #[test]
    fn rejects_unordered_ema_periods() {
        let mut config = ScreenerConfig::default();
        config.indicators.ema_mid = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPeriod { .. })
        ));
    }

    #[test]
    fn rejects_short_min_history() {
        let mut config = ScreenerConfig::default();
        config.min_history = 150;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_atr_multiplier() {
        let mut config = ScreenerConfig::default();
        config.levels.atr_stop_multiplier = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { name: "atr_stop_multiplier", .. })
        ));
    }

    #[test]
    fn rejects_impossible_min_signals() {
        let mut config = ScreenerConfig::default();
        config.signals.min_signals = 6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_extra_target_below_minimum() {
        let mut config = ScreenerConfig::default();
        config.levels.extra_target_multiples = vec![1.5];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = ScreenerConfig::from_toml(
            r#"
            [filters]
            min_price = 5.0
            "#,
        )
        .unwrap();
        assert_eq!(config.filters.min_price, 5.0);
        assert_eq!(config.filters.min_avg_volume, 100_000.0);
        assert_eq!(config.indicators.ema_long, 200);
    }

    #[test]
    fn toml_with_bad_weights_is_rejected() {
        let result = ScreenerConfig::from_toml(
            r#"
            [scoring.weights]
            signal_count = 0.9
            "#,
        );
        assert!(matches!(result, Err(ConfigError::WeightsDoNotSumToOne { .. })));
    }

    #[test]
    fn toml_roundtrip() {
        let config = ScreenerConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(ScreenerConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let a = ScreenerConfig::default();
        let b = ScreenerConfig::default();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), a.with_min_price(5.0).fingerprint());
    }
}
