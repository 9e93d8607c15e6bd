//! Screener — runs one symbol through the full pipeline.
//!
//! ```text
//! series ─▶ indicators ─▶ filter gate ─▶ signals ─▶ levels ─▶ score ─▶ Candidate
//!                              │                      │         │
//!                              ▼                      ▼         ▼
//!                          Filtered        IndeterminateLevels  InsufficientSignals
//! ```
//!
//! Each evaluation is a pure function of the config and the series, so the
//! runner can evaluate symbols on any number of threads.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidate::{finite, Candidate, LatestSnapshot};
use crate::components::levels::round2;
use crate::components::{
    FilterGate, FilterRule, LevelCalculator, ScoreInputs, Scorer, SignalDetector,
};
use crate::config::{ConfigError, ScreenerConfig};
use crate::data::universe::Listing;
use crate::domain::PriceSeries;
use crate::indicators::snapshot::latest;
use crate::indicators::{trailing_mean_before, IndicatorSnapshot};

/// Why a symbol did not produce a candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rejection {
    InsufficientHistory { bars: usize, required: usize },
    Filtered { rule: FilterRule },
    InsufficientSignals { count: usize, required: usize },
    IndeterminateLevels { reason: String },
}

/// Outcome of evaluating one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Qualified(Box<Candidate>),
    Rejected(Rejection),
}

impl Evaluation {
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            Self::Qualified(c) => Some(c),
            Self::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Qualified(_) => None,
            Self::Rejected(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Screener {
    config: ScreenerConfig,
    gate: FilterGate,
    detector: SignalDetector,
    calculator: LevelCalculator,
    scorer: Scorer,
}

impl Screener {
    /// Validate `config` and build every component from it.
    pub fn new(config: ScreenerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            gate: FilterGate::new(&config.filters),
            detector: SignalDetector::new(&config.signals, config.indicators.volume_avg_period),
            calculator: LevelCalculator::new(&config.levels),
            scorer: Scorer::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Evaluate one listing against its price history.
    pub fn evaluate(&self, listing: &Listing, series: &PriceSeries) -> Evaluation {
        let symbol = listing.symbol.as_str();
        if series.len() < self.config.min_history {
            debug!(symbol, bars = series.len(), "insufficient history");
            return Evaluation::Rejected(Rejection::InsufficientHistory {
                bars: series.len(),
                required: self.config.min_history,
            });
        }

        let snapshot = IndicatorSnapshot::compute(series, &self.config.indicators);
        self.evaluate_with(listing, series, &snapshot)
    }

    /// Evaluate with indicators computed elsewhere.
    ///
    /// `snapshot` must be aligned with `series`. The history-length check is
    /// skipped; the filter gate still rejects undefined long-EMA readings.
    pub fn evaluate_with(
        &self,
        listing: &Listing,
        series: &PriceSeries,
        snapshot: &IndicatorSnapshot,
    ) -> Evaluation {
        let symbol = listing.symbol.as_str();
        let verdict = self.gate.evaluate(series, snapshot);
        if let Some(rule) = verdict.failed {
            debug!(
                symbol,
                rule = rule.label(),
                close = verdict.readings.close,
                ema_long = verdict.readings.ema_long,
                avg_volume = verdict.readings.avg_volume,
                "filtered"
            );
            return Evaluation::Rejected(Rejection::Filtered { rule });
        }

        let signals = self.detector.detect(series, snapshot);
        let bar = series.latest();
        let atr = latest(&snapshot.atr);

        let levels = match self.calculator.calculate(bar.close, atr, &snapshot.levels) {
            Ok(levels) => levels,
            Err(e) => {
                debug!(symbol, error = %e, "levels indeterminate");
                return Evaluation::Rejected(Rejection::IndeterminateLevels {
                    reason: e.to_string(),
                });
            }
        };

        let signal_count = signals.count();
        if signal_count < self.config.signals.min_signals {
            debug!(symbol, signal_count, "not enough signals");
            return Evaluation::Rejected(Rejection::InsufficientSignals {
                count: signal_count,
                required: self.config.signals.min_signals,
            });
        }

        let last = series.len() - 1;
        let avg_volume = trailing_mean_before(
            &series.volumes(),
            last,
            self.config.indicators.volume_avg_period,
        );
        let inputs = ScoreInputs {
            active_signals: signals.active(),
            risk_reward: levels.risk_reward,
            volume: bar.volume as f64,
            avg_volume,
            close: bar.close,
            ema_short: latest(&snapshot.ema_short),
            ema_mid: latest(&snapshot.ema_mid),
            ema_long: latest(&snapshot.ema_long),
            rsi: latest(&snapshot.rsi),
        };
        let score_breakdown = self.scorer.score(&inputs);
        let score = score_breakdown.score();
        debug!(symbol, score, signal_count, "qualified");

        Evaluation::Qualified(Box::new(Candidate {
            symbol: listing.symbol.clone(),
            company: listing.company.clone(),
            industry: listing.industry.clone(),
            latest: LatestSnapshot {
                date: bar.date,
                close: bar.close,
                volume: bar.volume,
                ema_short: finite(inputs.ema_short),
                ema_mid: finite(inputs.ema_mid),
                ema_long: finite(inputs.ema_long),
                rsi: finite(inputs.rsi),
                macd: finite(latest(&snapshot.macd)),
                macd_signal: finite(latest(&snapshot.macd_signal)),
                atr: finite(atr),
                avg_volume,
            },
            signals,
            signal_count,
            score,
            score_breakdown,
            levels: levels.rounded(),
            supports: snapshot.levels.supports.iter().map(|s| round2(*s)).collect(),
            resistances: snapshot.levels.resistances.iter().map(|r| round2(*r)).collect(),
            sparkline: series.sparkline(self.config.sparkline_len),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_config() {
        let mut config = ScreenerConfig::default();
        config.scoring.weights.rsi = 0.5;
        assert!(Screener::new(config).is_err());
    }

    #[test]
    fn short_history_is_rejected_before_indicators() {
        let screener = Screener::new(ScreenerConfig::default()).unwrap();
        let bars = crate::indicators::make_bars(&[100.0; 50]);
        let series = PriceSeries::new("AAA", bars).unwrap();
        let listing = Listing::new("AAA", "Aaa Corp", "Tech");
        assert_eq!(
            screener.evaluate(&listing, &series).rejection(),
            Some(&Rejection::InsufficientHistory {
                bars: 50,
                required: 200
            })
        );
    }
}
