//! IndicatorSnapshot — every indicator series the pipeline reads for one symbol.
//!
//! Built once per symbol per scan. Series are aligned with the bars of the
//! source [`PriceSeries`]: index `i` of every vector belongs to bar `i`.

use serde::{Deserialize, Serialize};

use super::support_resistance::{find_levels, PriceLevels};
use super::{Atr, Ema, Indicator, Macd, Rsi, VolumeSma};
use crate::config::IndicatorParams;
use crate::domain::PriceSeries;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema_short: Vec<f64>,
    pub ema_mid: Vec<f64>,
    pub ema_long: Vec<f64>,
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub atr: Vec<f64>,
    /// Volume SMA including the bar itself.
    pub volume_sma: Vec<f64>,
    /// Support/resistance as of the latest bar.
    pub levels: PriceLevels,
}

impl IndicatorSnapshot {
    /// Compute all indicators for `series`.
    pub fn compute(series: &PriceSeries, params: &IndicatorParams) -> Self {
        let bars = series.bars();
        let run = |ind: &dyn Indicator| {
            let values = ind.compute(bars);
            debug_assert_eq!(values.len(), bars.len(), "{} misaligned", ind.name());
            values
        };

        Self {
            ema_short: run(&Ema::new(params.ema_short)),
            ema_mid: run(&Ema::new(params.ema_mid)),
            ema_long: run(&Ema::new(params.ema_long)),
            rsi: run(&Rsi::new(params.rsi_period)),
            macd: run(&Macd::line(params.macd_fast, params.macd_slow, params.macd_signal)),
            macd_signal: run(&Macd::signal(
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            )),
            atr: run(&Atr::new(params.atr_period)),
            volume_sma: run(&VolumeSma::new(params.volume_avg_period)),
            levels: find_levels(
                bars,
                params.sr_lookback,
                params.sr_swing_window,
                params.sr_cluster_tolerance,
            ),
        }
    }

    /// Number of aligned bars.
    pub fn len(&self) -> usize {
        self.ema_short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema_short.is_empty()
    }

    /// Index of the latest bar.
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }
}

/// Value at `index`, NaN when out of range.
pub fn value_at(series: &[f64], index: usize) -> f64 {
    series.get(index).copied().unwrap_or(f64::NAN)
}

/// Latest value, NaN when empty.
pub fn latest(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}
