//! Candidate — a qualified setup, immutable once assembled.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::components::{ScoreBreakdown, Signals, TradeLevels};

/// Latest-bar readings carried for display. Undefined indicator values are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: u64,
    pub ema_short: Option<f64>,
    pub ema_mid: Option<f64>,
    pub ema_long: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub atr: Option<f64>,
    /// Average volume of the bars before `date`.
    pub avg_volume: Option<f64>,
}

pub(crate) fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: String,
    pub company: String,
    pub industry: String,
    pub latest: LatestSnapshot,
    pub signals: Signals,
    pub signal_count: usize,
    pub score: u32,
    pub score_breakdown: ScoreBreakdown,
    /// Rounded to cents.
    pub levels: TradeLevels,
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
    pub sparkline: Vec<f64>,
}

/// Ranking order: score descending, then symbol ascending.
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.cmp(&a.score).then_with(|| a.symbol.cmp(&b.symbol))
}

/// Sort candidates into ranking order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(rank_order);
}
