//! Filter gate — pre-screens a symbol before any signal work.
//!
//! Rules run in a fixed order and the first failure wins:
//! 1. Trend: latest close above the long EMA
//! 2. Volume: volume SMA (latest bar included) at or above the minimum
//! 3. Price: latest close at or above the minimum price
//!
//! NaN at any read position fails that rule.

use serde::{Deserialize, Serialize};

use crate::config::FilterParams;
use crate::domain::PriceSeries;
use crate::indicators::snapshot::latest;
use crate::indicators::IndicatorSnapshot;

/// Which filter rule rejected a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRule {
    Trend,
    Volume,
    Price,
}

impl FilterRule {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Trend => "below long EMA",
            Self::Volume => "thin volume",
            Self::Price => "below minimum price",
        }
    }
}

/// Values the gate compared, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterReadings {
    pub close: f64,
    pub ema_long: f64,
    pub avg_volume: f64,
}

/// Outcome of a filter gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterVerdict {
    pub failed: Option<FilterRule>,
    pub readings: FilterReadings,
}

impl FilterVerdict {
    pub fn is_passed(&self) -> bool {
        self.failed.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct FilterGate {
    min_avg_volume: f64,
    min_price: f64,
}

impl FilterGate {
    pub fn new(params: &FilterParams) -> Self {
        Self {
            min_avg_volume: params.min_avg_volume,
            min_price: params.min_price,
        }
    }

    pub fn evaluate(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot) -> FilterVerdict {
        let readings = FilterReadings {
            close: series.latest().close,
            ema_long: latest(&snapshot.ema_long),
            avg_volume: latest(&snapshot.volume_sma),
        };

        // NaN compares false, so a missing reading fails its rule.
        let trend_ok = readings.close > readings.ema_long;
        let volume_ok = readings.avg_volume >= self.min_avg_volume;
        let price_ok = readings.close >= self.min_price;

        let failed = if !trend_ok {
            Some(FilterRule::Trend)
        } else if !volume_ok {
            Some(FilterRule::Volume)
        } else if !price_ok {
            Some(FilterRule::Price)
        } else {
            None
        };

        FilterVerdict { failed, readings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::{flat_snapshot, series};

    fn gate() -> FilterGate {
        FilterGate::new(&FilterParams::default())
    }

    #[test]
    fn passes_healthy_uptrend() {
        let s = series(&[105.0; 5], &[200_000]);
        let snap = flat_snapshot(5, (100.0, 95.0, 90.0), 50.0, 2.0, 200_000.0);
        assert!(gate().evaluate(&s, &snap).is_passed());
    }

    #[test]
    fn rejects_below_long_ema() {
        let s = series(&[85.0; 5], &[200_000]);
        let snap = flat_snapshot(5, (100.0, 95.0, 90.0), 50.0, 2.0, 200_000.0);
        assert_eq!(gate().evaluate(&s, &snap).failed, Some(FilterRule::Trend));
    }

    #[test]
    fn rejects_thin_volume() {
        let s = series(&[105.0; 5], &[50_000]);
        let snap = flat_snapshot(5, (100.0, 95.0, 90.0), 50.0, 2.0, 50_000.0);
        let verdict = gate().evaluate(&s, &snap);
        assert_eq!(verdict.failed, Some(FilterRule::Volume));
        assert_eq!(verdict.readings.avg_volume, 50_000.0);
    }

    #[test]
    fn rejects_cheap_stock_after_other_rules() {
        let s = series(&[20.0; 5], &[200_000]);
        let snap = flat_snapshot(5, (19.0, 18.0, 17.0), 50.0, 1.0, 200_000.0);
        assert_eq!(gate().evaluate(&s, &snap).failed, Some(FilterRule::Price));
    }

    #[test]
    fn trend_failure_wins_over_volume() {
        let s = series(&[20.0; 5], &[10]);
        let snap = flat_snapshot(5, (30.0, 30.0, 30.0), 50.0, 1.0, 10.0);
        assert_eq!(gate().evaluate(&s, &snap).failed, Some(FilterRule::Trend));
    }

    #[test]
    fn nan_ema_fails_trend() {
        let s = series(&[105.0; 5], &[200_000]);
        let snap = flat_snapshot(5, (100.0, 95.0, f64::NAN), 50.0, 2.0, 200_000.0);
        assert_eq!(gate().evaluate(&s, &snap).failed, Some(FilterRule::Trend));
    }

    #[test]
    fn custom_min_price_applies() {
        let params = FilterParams {
            min_price: 5.0,
            ..FilterParams::default()
        };
        let s = series(&[20.0; 5], &[200_000]);
        let snap = flat_snapshot(5, (19.0, 18.0, 17.0), 50.0, 1.0, 200_000.0);
        assert!(FilterGate::new(&params).evaluate(&s, &snap).is_passed());
    }
}
