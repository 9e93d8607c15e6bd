//! SwingScan Core — indicators, pipeline components, and the per-symbol screener.
//!
//! This crate contains everything needed to evaluate one stock:
//! - Domain types (bars, validated price series)
//! - Indicator math (EMA, RSI, MACD, ATR, volume averages, support/resistance)
//! - The filter gate, signal detector, level calculator and scorer
//! - The `Screener`, which assembles them into ranked `Candidate` records
//! - Series providers, the per-day series cache, and universes

pub mod candidate;
pub mod components;
pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;

pub use candidate::{rank, Candidate, LatestSnapshot};
pub use config::{ConfigError, ScreenerConfig};
pub use pipeline::{Evaluation, Rejection, Screener};
