//! Volume averages.
//!
//! Two conventions are in use:
//! - [`VolumeSma`]: rolling mean ending at (and including) each bar. The
//!   liquidity filter reads this.
//! - [`trailing_mean_before`]: mean of the bars strictly before a position.
//!   The surge detector and the volume factor read this, so a spike cannot
//!   raise its own threshold.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume SMA period must be >= 1");
        Self {
            period,
            name: format!("volume_sma_{period}"),
        }
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        sma_of_series(&volumes, self.period)
    }
}

/// Mean of `values[index - period..index]`.
///
/// `None` when fewer than `period` values precede `index` or any of them is NaN.
pub fn trailing_mean_before(values: &[f64], index: usize, period: usize) -> Option<f64> {
    if period == 0 || index < period || index > values.len() {
        return None;
    }
    let window = &values[index - period..index];
    if window.iter().any(|v| v.is_nan()) {
        return None;
    }
    Some(window.iter().sum::<f64>() / period as f64)
}
