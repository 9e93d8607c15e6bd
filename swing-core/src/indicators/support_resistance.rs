//! Support and resistance levels from swing points.
//!
//! A bar is a swing low (high) when its low (high) is the extreme of the
//! `2 * window + 1` bars centred on it. Only the most recent `lookback` bars
//! are scanned; shorter histories fall back to `max(20, len - 5)` bars.
//! Raw levels within `tolerance` of their neighbour are merged into one level
//! at the cluster mean.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// Minimum scan length used when the history is shorter than the lookback.
const MIN_SCAN_BARS: usize = 20;

/// Clustered price levels, each list ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceLevels {
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

impl PriceLevels {
    /// Highest support strictly below `price`.
    pub fn support_below(&self, price: f64) -> Option<f64> {
        self.supports.iter().rev().copied().find(|&s| s < price)
    }

    /// Highest support at or below `price`.
    pub fn support_at_or_below(&self, price: f64) -> Option<f64> {
        self.supports.iter().rev().copied().find(|&s| s <= price)
    }

    /// Lowest resistance strictly above `price`.
    pub fn resistance_above(&self, price: f64) -> Option<f64> {
        self.resistances.iter().copied().find(|&r| r > price)
    }
}

/// Detect and cluster swing-point levels over the tail of `bars`.
pub fn find_levels(bars: &[Bar], lookback: usize, window: usize, tolerance: f64) -> PriceLevels {
    let scan = if bars.len() < lookback {
        MIN_SCAN_BARS.max(bars.len().saturating_sub(5)).min(bars.len())
    } else {
        lookback
    };
    let recent = &bars[bars.len() - scan..];
    if window == 0 || recent.len() < 2 * window + 1 {
        return PriceLevels::default();
    }

    let mut lows = Vec::new();
    let mut highs = Vec::new();
    for i in window..recent.len() - window {
        let span = &recent[i - window..=i + window];
        let low = recent[i].low;
        let high = recent[i].high;
        if span.iter().all(|b| b.low >= low) {
            lows.push(low);
        }
        if span.iter().all(|b| b.high <= high) {
            highs.push(high);
        }
    }

    PriceLevels {
        supports: cluster_levels(lows, tolerance),
        resistances: cluster_levels(highs, tolerance),
    }
}

/// Merge levels lying within `tolerance` (relative) of the previous member
/// of the running cluster. Returns cluster means, ascending.
pub fn cluster_levels(mut levels: Vec<f64>, tolerance: f64) -> Vec<f64> {
    levels.retain(|l| l.is_finite() && *l > 0.0);
    levels.sort_by(|a, b| a.total_cmp(b));

    let mut clustered = Vec::new();
    let mut cluster: Vec<f64> = Vec::new();
    for level in levels {
        if let Some(&last) = cluster.last() {
            if (level - last).abs() / last > tolerance {
                clustered.push(mean(&cluster));
                cluster.clear();
            }
        }
        cluster.push(level);
    }
    if !cluster.is_empty() {
        clustered.push(mean(&cluster));
    }
    clustered
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
