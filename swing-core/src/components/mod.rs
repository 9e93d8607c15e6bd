//! Pipeline components — one stage each, composed by the `Screener`.
//!
//! - Filter gate: trend, liquidity and price pre-screen
//! - Signal detector: five fixed pattern rules
//! - Level calculator: entry, stop and targets
//! - Scorer: weighted five-factor score with per-factor reasons
//!
//! Components are built from the validated `ScreenerConfig` and hold no
//! mutable state, so one instance serves every symbol of a scan.

pub mod filter;
pub mod levels;
pub mod reason;
pub mod scorer;
pub mod signal;

pub use filter::{FilterGate, FilterReadings, FilterRule, FilterVerdict};
pub use levels::{LevelCalculator, LevelError, TradeLevels};
pub use scorer::{Factor, FactorScore, ScoreBreakdown, ScoreInputs, Scorer};
pub use signal::{SignalDetector, SignalKind, Signals};
