//! Series provider trait and structured error types.
//!
//! The SeriesProvider trait abstracts over data sources (Yahoo Finance, CSV
//! directories, synthetic generators) so the runner can swap implementations
//! and tests can mock them. Providers know nothing about the day cache.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{PriceSeries, SeriesError};

/// Structured error types for data operations.
///
/// Every variant means the same thing to the screener: no usable series for
/// this symbol today. The variants exist for logging.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("no bars for '{symbol}' on or before {as_of}")]
    NoDataBefore { symbol: String, as_of: NaiveDate },

    #[error("invalid series: {0}")]
    InvalidSeries(#[from] SeriesError),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Where a series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    Csv,
    Cache,
    Synthetic,
}

/// Trait for series providers.
pub trait SeriesProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    fn source(&self) -> DataSource;

    /// Daily history for `symbol`: at most `lookback_days` bars, all dated on
    /// or before `as_of`, oldest first.
    fn get_series(
        &self,
        symbol: &str,
        lookback_days: usize,
        as_of: NaiveDate,
    ) -> Result<PriceSeries, DataError>;

    /// Whether the provider is currently usable (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Truncate a full history to the requested point-in-time window.
pub fn window(series: &PriceSeries, lookback_days: usize, as_of: NaiveDate) -> Result<PriceSeries, DataError> {
    series
        .as_of(as_of)
        .map(|s| s.tail(lookback_days))
        .ok_or_else(|| DataError::NoDataBefore {
            symbol: series.symbol().to_string(),
            as_of,
        })
}

/// Calendar days that comfortably cover `trading_days` sessions.
pub fn calendar_span(trading_days: usize) -> i64 {
    (trading_days as i64 * 7) / 5 + 15
}
