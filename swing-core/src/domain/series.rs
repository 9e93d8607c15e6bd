//! PriceSeries — the validated daily history of one symbol.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Bar;

/// Errors raised while building a [`PriceSeries`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series for '{symbol}' is empty")]
    Empty { symbol: String },

    #[error("series for '{symbol}' is not strictly increasing at {date}")]
    NotStrictlyIncreasing { symbol: String, date: NaiveDate },
}

/// Ordered daily bars for a single symbol, oldest first.
///
/// Invariant: dates are strictly increasing (no duplicates). Enforced by
/// [`PriceSeries::new`]; the fields are private so the invariant holds for
/// every value of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Validate and wrap a bar sequence.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { symbol });
        }
        if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(SeriesError::NotStrictlyIncreasing {
                date: pair[1].date,
                symbol,
            });
        }
        Ok(Self { symbol, bars })
    }

    /// Sort, deduplicate (last bar wins) and drop void bars before validating.
    ///
    /// Used by providers whose raw output may be unordered or contain holiday rows.
    pub fn from_unsorted(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Result<Self, SeriesError> {
        bars.retain(|b| !b.is_void());
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }
        Self::new(symbol, deduped)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// The most recent bar. A series is never empty.
    pub fn latest(&self) -> &Bar {
        &self.bars[self.bars.len() - 1]
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.latest().date
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// Truncate to bars dated on or before `date`.
    ///
    /// Returns `None` when no bar survives.
    pub fn as_of(&self, date: NaiveDate) -> Option<Self> {
        let end = self.bars.partition_point(|b| b.date <= date);
        if end == 0 {
            return None;
        }
        Some(Self {
            symbol: self.symbol.clone(),
            bars: self.bars[..end].to_vec(),
        })
    }

    /// Keep only the most recent `n` bars.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.bars.len().saturating_sub(n.max(1));
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }

    /// The last `n` closes rounded to cents, oldest first.
    pub fn sparkline(&self, n: usize) -> Vec<f64> {
        let start = self.bars.len().saturating_sub(n);
        self.bars[start..]
            .iter()
            .map(|b| (b.close * 100.0).round() / 100.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            PriceSeries::new("AAA", vec![]),
            Err(SeriesError::Empty { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::new("AAA", vec![bar(1, 10.0), bar(1, 11.0)]).unwrap_err();
        assert!(matches!(err, SeriesError::NotStrictlyIncreasing { .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        assert!(PriceSeries::new("AAA", vec![bar(2, 10.0), bar(1, 11.0)]).is_err());
    }

    #[test]
    fn from_unsorted_sorts_dedups_and_drops_void() {
        let mut void = bar(3, 12.0);
        void.close = f64::NAN;
        let series = PriceSeries::from_unsorted(
            "AAA",
            vec![bar(2, 11.0), bar(1, 10.0), bar(2, 11.5), void],
        )
        .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().close, 11.5);
    }

    #[test]
    fn as_of_truncates() {
        let series = PriceSeries::new("AAA", vec![bar(1, 10.0), bar(2, 11.0), bar(4, 12.0)]).unwrap();
        let cut = series.as_of(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()).unwrap();
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.last_date(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert!(series.as_of(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()).is_none());
    }

    #[test]
    fn sparkline_rounds_and_limits() {
        let series =
            PriceSeries::new("AAA", vec![bar(1, 10.004), bar(2, 11.006), bar(3, 12.0)]).unwrap();
        assert_eq!(series.sparkline(2), vec![11.01, 12.0]);
        assert_eq!(series.sparkline(10).len(), 3);
    }
}
