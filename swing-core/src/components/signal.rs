//! Signal detector — five fixed pattern rules over the trailing bars.
//!
//! Every rule runs on every symbol that passes the filter gate; each reads
//! only the latest few bars of the snapshot and treats NaN as "not met".

use serde::{Deserialize, Serialize};

use crate::config::SignalParams;
use crate::domain::PriceSeries;
use crate::indicators::snapshot::value_at;
use crate::indicators::{trailing_mean_before, IndicatorSnapshot};

/// The closed set of bullish patterns the screener looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    EmaAligned,
    RsiRecovery,
    MacdCrossover,
    SupportBounce,
    VolumeSurge,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::EmaAligned,
        SignalKind::RsiRecovery,
        SignalKind::MacdCrossover,
        SignalKind::SupportBounce,
        SignalKind::VolumeSurge,
    ];

    /// Stable machine key, matching the serialized field name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::EmaAligned => "ema_aligned",
            Self::RsiRecovery => "rsi_recovery",
            Self::MacdCrossover => "macd_crossover",
            Self::SupportBounce => "support_bounce",
            Self::VolumeSurge => "volume_surge",
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmaAligned => "EMA",
            Self::RsiRecovery => "RSI",
            Self::MacdCrossover => "MACD",
            Self::SupportBounce => "SUP",
            Self::VolumeSurge => "VOL",
        }
    }
}

/// Detector output for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub ema_aligned: bool,
    pub rsi_recovery: bool,
    pub macd_crossover: bool,
    pub support_bounce: bool,
    pub volume_surge: bool,
    /// Bars since the most recent bullish MACD crossover (0 = latest bar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd_cross_bars_ago: Option<usize>,
}

impl Signals {
    pub fn get(&self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::EmaAligned => self.ema_aligned,
            SignalKind::RsiRecovery => self.rsi_recovery,
            SignalKind::MacdCrossover => self.macd_crossover,
            SignalKind::SupportBounce => self.support_bounce,
            SignalKind::VolumeSurge => self.volume_surge,
        }
    }

    pub fn count(&self) -> usize {
        SignalKind::ALL.iter().filter(|k| self.get(**k)).count()
    }

    pub fn active(&self) -> Vec<SignalKind> {
        SignalKind::ALL.into_iter().filter(|k| self.get(*k)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SignalDetector {
    params: SignalParams,
    volume_period: usize,
}

impl SignalDetector {
    pub fn new(params: &SignalParams, volume_period: usize) -> Self {
        Self {
            params: params.clone(),
            volume_period,
        }
    }

    pub fn detect(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot) -> Signals {
        let Some(last) = series.len().checked_sub(1) else {
            return Signals::default();
        };
        let macd_cross_bars_ago = self.macd_crossover(snapshot, last);
        Signals {
            ema_aligned: self.ema_aligned(series, snapshot, last),
            rsi_recovery: self.rsi_recovery(snapshot, last),
            macd_crossover: macd_cross_bars_ago.is_some(),
            support_bounce: self.support_bounce(series, snapshot, last),
            volume_surge: self.volume_surge(series, last),
            macd_cross_bars_ago,
        }
    }

    fn ema_aligned(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot, last: usize) -> bool {
        let close = series.bars()[last].close;
        let short = value_at(&snapshot.ema_short, last);
        let mid = value_at(&snapshot.ema_mid, last);
        close > short && short > mid
    }

    fn rsi_recovery(&self, snapshot: &IndicatorSnapshot, last: usize) -> bool {
        if last == 0 {
            return false;
        }
        let current = value_at(&snapshot.rsi, last);
        let previous = value_at(&snapshot.rsi, last - 1);
        let oversold = self.params.rsi_oversold;

        let start = (last + 1).saturating_sub(self.params.rsi_recovery_lookback);
        let was_oversold = snapshot.rsi[start..=last]
            .iter()
            .any(|r| !r.is_nan() && *r <= oversold);

        was_oversold && current > oversold && current >= previous
    }

    /// Offset of the most recent flip from `macd <= signal` to `macd > signal`.
    fn macd_crossover(&self, snapshot: &IndicatorSnapshot, last: usize) -> Option<usize> {
        let diff = |i: usize| value_at(&snapshot.macd, i) - value_at(&snapshot.macd_signal, i);
        (0..self.params.macd_crossover_lookback)
            .take_while(|&ago| ago < last)
            .find(|&ago| {
                let i = last - ago;
                let (now, before) = (diff(i), diff(i - 1));
                now > 0.0 && before <= 0.0
            })
    }

    fn support_bounce(&self, series: &PriceSeries, snapshot: &IndicatorSnapshot, last: usize) -> bool {
        if last == 0 {
            return false;
        }
        let bars = series.bars();
        let close = bars[last].close;
        let Some(support) = snapshot.levels.support_at_or_below(close) else {
            return false;
        };
        let proximity = (close - support) / support;
        proximity <= self.params.support_proximity_pct && close > bars[last - 1].close
    }

    fn volume_surge(&self, series: &PriceSeries, last: usize) -> bool {
        let volumes = series.volumes();
        match trailing_mean_before(&volumes, last, self.volume_period) {
            Some(avg) if avg > 0.0 => volumes[last] >= self.params.volume_surge_factor * avg,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::fixtures::{flat_snapshot, series};
    use crate::indicators::PriceLevels;

    fn detector() -> SignalDetector {
        SignalDetector::new(&SignalParams::default(), 20)
    }

    fn uptrend_snapshot(n: usize) -> IndicatorSnapshot {
        flat_snapshot(n, (100.0, 95.0, 90.0), 50.0, 2.0, 200_000.0)
    }

    #[test]
    fn ema_alignment_requires_strict_order() {
        let s = series(&[105.0; 30], &[100_000]);
        assert!(detector().detect(&s, &uptrend_snapshot(30)).ema_aligned);

        let tangled = flat_snapshot(30, (100.0, 101.0, 90.0), 50.0, 2.0, 1.0);
        assert!(!detector().detect(&s, &tangled).ema_aligned);
    }

    #[test]
    fn rsi_recovery_from_oversold() {
        let s = series(&[105.0; 30], &[100_000]);
        let mut snap = uptrend_snapshot(30);
        let n = snap.rsi.len();
        snap.rsi[n - 4] = 35.0;
        snap.rsi[n - 3] = 38.0;
        snap.rsi[n - 2] = 42.0;
        snap.rsi[n - 1] = 45.0;
        assert!(detector().detect(&s, &snap).rsi_recovery);
    }

    #[test]
    fn rsi_recovery_needs_oversold_within_window() {
        let s = series(&[105.0; 30], &[100_000]);
        let mut snap = uptrend_snapshot(30);
        let n = snap.rsi.len();
        // oversold six bars ago is outside the five-bar window
        snap.rsi[n - 6] = 30.0;
        snap.rsi[n - 2] = 44.0;
        snap.rsi[n - 1] = 45.0;
        assert!(!detector().detect(&s, &snap).rsi_recovery);
    }

    #[test]
    fn rsi_recovery_rejects_falling_rsi() {
        let s = series(&[105.0; 30], &[100_000]);
        let mut snap = uptrend_snapshot(30);
        let n = snap.rsi.len();
        snap.rsi[n - 3] = 35.0;
        snap.rsi[n - 2] = 48.0;
        snap.rsi[n - 1] = 45.0;
        assert!(!detector().detect(&s, &snap).rsi_recovery);
    }

    #[test]
    fn macd_crossover_reports_most_recent_flip() {
        let s = series(&[105.0; 30], &[100_000]);
        let mut snap = uptrend_snapshot(30);
        let n = snap.macd.len();
        snap.macd[n - 3] = -1.0;
        snap.macd[n - 2] = 0.5;
        snap.macd[n - 1] = 0.8;
        let signals = detector().detect(&s, &snap);
        assert!(signals.macd_crossover);
        assert_eq!(signals.macd_cross_bars_ago, Some(1));
    }

    #[test]
    fn macd_crossover_outside_window_is_ignored() {
        let s = series(&[105.0; 30], &[100_000]);
        let mut snap = uptrend_snapshot(30);
        let n = snap.macd.len();
        for v in &mut snap.macd[n - 4..] {
            *v = 1.0;
        }
        let signals = detector().detect(&s, &snap);
        assert!(!signals.macd_crossover);
        assert_eq!(signals.macd_cross_bars_ago, None);
    }

    #[test]
    fn support_bounce_near_support_on_up_day() {
        let mut closes = vec![100.0; 29];
        closes.push(101.0);
        let s = series(&closes, &[100_000]);
        let mut snap = uptrend_snapshot(30);
        snap.levels = PriceLevels {
            supports: vec![90.0, 100.0],
            resistances: vec![],
        };
        assert!(detector().detect(&s, &snap).support_bounce);
    }

    #[test]
    fn support_bounce_rejects_far_support() {
        let mut closes = vec![100.0; 29];
        closes.push(101.0);
        let s = series(&closes, &[100_000]);
        let mut snap = uptrend_snapshot(30);
        snap.levels.supports = vec![95.0];
        assert!(!detector().detect(&s, &snap).support_bounce);
    }

    #[test]
    fn support_bounce_rejects_down_day() {
        let mut closes = vec![102.0; 29];
        closes.push(101.0);
        let s = series(&closes, &[100_000]);
        let mut snap = uptrend_snapshot(30);
        snap.levels.supports = vec![100.0];
        assert!(!detector().detect(&s, &snap).support_bounce);
    }

    #[test]
    fn volume_surge_at_exact_threshold() {
        let mut volumes = vec![100_000u64; 29];
        volumes.push(150_000);
        let s = series(&[105.0; 30], &volumes);
        assert!(detector().detect(&s, &uptrend_snapshot(30)).volume_surge);
    }

    #[test]
    fn volume_surge_just_below_threshold() {
        let mut volumes = vec![100_000u64; 29];
        volumes.push(149_999);
        let s = series(&[105.0; 30], &volumes);
        assert!(!detector().detect(&s, &uptrend_snapshot(30)).volume_surge);
    }

    #[test]
    fn surge_threshold_ignores_todays_volume() {
        // an average that included today would need ~154k to trigger
        let mut volumes = vec![100_000u64; 29];
        volumes.push(152_000);
        let s = series(&[105.0; 30], &volumes);
        assert!(detector().detect(&s, &uptrend_snapshot(30)).volume_surge);
    }

    #[test]
    fn volume_surge_needs_full_prior_window() {
        let mut volumes = vec![100_000u64; 10];
        volumes.push(1_000_000);
        let s = series(&[105.0; 11], &volumes);
        assert!(!detector().detect(&s, &uptrend_snapshot(11)).volume_surge);
    }

    #[test]
    fn count_and_active_agree() {
        let signals = Signals {
            ema_aligned: true,
            volume_surge: true,
            ..Signals::default()
        };
        assert_eq!(signals.count(), 2);
        assert_eq!(
            signals.active(),
            vec![SignalKind::EmaAligned, SignalKind::VolumeSurge]
        );
    }

    #[test]
    fn detection_is_deterministic() {
        let s = series(&[105.0; 30], &[100_000, 180_000]);
        let snap = uptrend_snapshot(30);
        assert_eq!(detector().detect(&s, &snap), detector().detect(&s, &snap));
    }
}
