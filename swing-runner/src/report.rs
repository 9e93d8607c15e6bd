//! Scan report: ranked candidates plus per-outcome counts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use swing_core::{Candidate, Evaluation, Rejection};

/// Current schema version for persisted scan reports.
pub const SCHEMA_VERSION: u32 = 1;

/// How every symbol of a scan ended up.
///
/// `total == qualified + filtered + insufficient_signals
///  + indeterminate_levels + errored + skipped_cancelled`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub total: usize,
    /// Symbols that were attempted (not skipped by cancellation).
    pub scanned: usize,
    pub filtered: usize,
    pub insufficient_signals: usize,
    pub indeterminate_levels: usize,
    /// Fetch failures and series too short to evaluate.
    pub errored: usize,
    pub qualified: usize,
    pub skipped_cancelled: usize,
}

impl ScanStats {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record_evaluation(&mut self, evaluation: &Evaluation) {
        self.scanned += 1;
        match evaluation {
            Evaluation::Qualified(_) => self.qualified += 1,
            Evaluation::Rejected(Rejection::Filtered { .. }) => self.filtered += 1,
            Evaluation::Rejected(Rejection::InsufficientSignals { .. }) => {
                self.insufficient_signals += 1
            }
            Evaluation::Rejected(Rejection::IndeterminateLevels { .. }) => {
                self.indeterminate_levels += 1
            }
            Evaluation::Rejected(Rejection::InsufficientHistory { .. }) => self.errored += 1,
        }
    }

    pub fn record_error(&mut self) {
        self.scanned += 1;
        self.errored += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_cancelled += 1;
    }

    /// Sum of every outcome bucket; equals `total` once a scan completes.
    pub fn accounted(&self) -> usize {
        self.qualified
            + self.filtered
            + self.insufficient_signals
            + self.indeterminate_levels
            + self.errored
            + self.skipped_cancelled
    }
}

/// Complete result of one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: u32,
    /// Universe name.
    pub market: String,
    pub as_of: NaiveDate,
    pub config_fingerprint: String,
    /// True if any series came from the synthetic generator.
    pub synthetic: bool,
    /// Qualified candidates, best first.
    pub candidates: Vec<Candidate>,
    pub stats: ScanStats,
}

impl ScanReport {
    pub fn top(&self, n: usize) -> &[Candidate] {
        &self.candidates[..n.min(self.candidates.len())]
    }

    pub fn was_cancelled(&self) -> bool {
        self.stats.skipped_cancelled > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swing_core::components::FilterRule;

    #[test]
    fn outcomes_land_in_their_buckets() {
        let mut stats = ScanStats::new(6);
        stats.record_evaluation(&Evaluation::Rejected(Rejection::Filtered {
            rule: FilterRule::Volume,
        }));
        stats.record_evaluation(&Evaluation::Rejected(Rejection::InsufficientSignals {
            count: 1,
            required: 2,
        }));
        stats.record_evaluation(&Evaluation::Rejected(Rejection::IndeterminateLevels {
            reason: "ATR is zero or undefined".into(),
        }));
        stats.record_evaluation(&Evaluation::Rejected(Rejection::InsufficientHistory {
            bars: 120,
            required: 200,
        }));
        stats.record_error();
        stats.record_skipped();

        assert_eq!(stats.filtered, 1);
        assert_eq!(stats.insufficient_signals, 1);
        assert_eq!(stats.indeterminate_levels, 1);
        assert_eq!(stats.errored, 2);
        assert_eq!(stats.skipped_cancelled, 1);
        assert_eq!(stats.scanned, 5);
        assert_eq!(stats.accounted(), stats.total);
    }

    #[test]
    fn top_is_bounded() {
        let report = ScanReport {
            schema_version: SCHEMA_VERSION,
            market: "dow_30".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            config_fingerprint: "abc".into(),
            synthetic: false,
            candidates: vec![],
            stats: ScanStats::new(0),
        };
        assert!(report.top(10).is_empty());
        assert!(!report.was_cancelled());
    }
}
