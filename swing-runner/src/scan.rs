//! Scan driver — evaluates every listing of a universe and ranks the results.
//!
//! Symbols are independent, so they run on a rayon pool bounded by
//! `ScanOptions::threads` (1 = sequential on the calling thread). Loading
//! and evaluation happen inside the worker; the driver only tallies.
//!
//! Cancellation is cooperative: the flag is checked before each symbol
//! starts. Symbols not started are counted as `skipped_cancelled`, in-flight
//! symbols finish normally.
//!
//! A panic while loading or evaluating one symbol is caught in the worker and
//! counted as `errored`; the other symbols still run.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{error, info, warn};

use swing_core::data::{DataSource, Listing, Universe};
use swing_core::{rank, ConfigError, Evaluation, Screener, ScreenerConfig};

use crate::data_loader::SeriesLoader;
use crate::report::{ScanReport, ScanStats, SCHEMA_VERSION};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("universe '{0}' has no symbols to scan")]
    EmptyUniverse(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Scan only the first N listings.
    pub max_stocks: Option<usize>,
    /// Worker threads. 1 runs sequentially; 0 lets rayon pick.
    pub threads: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_stocks: None,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Progress update, sent after each symbol finishes.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    pub completed: usize,
    pub total: usize,
    pub symbol: String,
}

enum Outcome {
    Evaluated {
        evaluation: Evaluation,
        source: DataSource,
    },
    Errored,
    Skipped,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Scan `universe` with `config`, loading series through `loader`.
///
/// The universe's `min_price`, when set, replaces the configured price
/// floor. Per-symbol failures are counted in the report, never raised.
pub fn run_scan(
    config: &ScreenerConfig,
    universe: &Universe,
    loader: &SeriesLoader<'_>,
    opts: &ScanOptions,
    progress_cb: Option<&(dyn Fn(&ScanProgress) + Sync)>,
    cancel: Option<&AtomicBool>,
) -> Result<ScanReport, ScanError> {
    let listings = universe.take(opts.max_stocks);
    if listings.is_empty() {
        return Err(ScanError::EmptyUniverse(universe.name.clone()));
    }

    let config = match universe.min_price {
        Some(floor) => config.with_min_price(floor),
        None => config.clone(),
    };
    let screener = Screener::new(config)?;

    let start_time = Instant::now();
    let total = listings.len();
    let completed = AtomicUsize::new(0);

    let evaluate_one = |listing: &Listing| -> Outcome {
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return Outcome::Skipped;
        }

        let run = || match loader.load(listing.provider_ticker()) {
            Ok(loaded) => Outcome::Evaluated {
                evaluation: screener.evaluate(listing, &loaded.series),
                source: loaded.source,
            },
            Err(e) => {
                warn!(symbol = %listing.symbol, error = %e, "data unavailable");
                Outcome::Errored
            }
        };
        let outcome = panic::catch_unwind(AssertUnwindSafe(run)).unwrap_or_else(|payload| {
            error!(
                symbol = %listing.symbol,
                panic = panic_message(payload.as_ref()),
                "evaluation panicked"
            );
            Outcome::Errored
        });

        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = progress_cb {
            cb(&ScanProgress {
                completed: done,
                total,
                symbol: listing.symbol.clone(),
            });
        }
        outcome
    };

    let outcomes: Vec<Outcome> = if opts.threads == 1 {
        listings.iter().map(&evaluate_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.threads)
            .build()
            .map_err(|e| ScanError::ThreadPool(e.to_string()))?;
        pool.install(|| listings.par_iter().map(&evaluate_one).collect())
    };

    let mut stats = ScanStats::new(total);
    let mut candidates = Vec::new();
    let mut synthetic = false;
    for outcome in outcomes {
        match outcome {
            Outcome::Evaluated { evaluation, source } => {
                synthetic |= source == DataSource::Synthetic;
                stats.record_evaluation(&evaluation);
                if let Evaluation::Qualified(candidate) = evaluation {
                    candidates.push(*candidate);
                }
            }
            Outcome::Errored => stats.record_error(),
            Outcome::Skipped => stats.record_skipped(),
        }
    }
    rank(&mut candidates);

    info!(
        market = %universe.name,
        total = stats.total,
        qualified = stats.qualified,
        filtered = stats.filtered,
        insufficient_signals = stats.insufficient_signals,
        indeterminate_levels = stats.indeterminate_levels,
        errored = stats.errored,
        skipped_cancelled = stats.skipped_cancelled,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "scan complete"
    );

    Ok(ScanReport {
        schema_version: SCHEMA_VERSION,
        market: universe.name.clone(),
        as_of: loader.options().as_of,
        config_fingerprint: screener.config().fingerprint(),
        synthetic,
        candidates,
        stats,
    })
}
