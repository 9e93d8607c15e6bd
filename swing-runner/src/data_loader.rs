//! Series loading for the scan driver.
//!
//! Resolves one symbol at a time, applying the fallback policy:
//! 1. If today's day cache holds a full-length series for the symbol at the
//!    same `as_of` → use it
//! 2. Otherwise, if a provider is available → fetch and cache. A short cached
//!    series is still used when the fetch fails
//! 3. If no data and `--synthetic` → generate a seeded synthetic series (tagged)
//! 4. Otherwise → fail with a clear error
//!
//! Failures are per symbol; the scan driver counts them and moves on.
//! Synthetic data is a demo/offline mode. Reports built from it are tagged.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, warn};

use swing_core::data::provider::window;
use swing_core::data::{DataError, DataSource, SeriesCache, SeriesProvider};
use swing_core::domain::{Bar, PriceSeries};

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(
        "no cached data for '{symbol}' and no network access (use --synthetic for synthetic data)"
    )]
    NoCachedDataOffline { symbol: String },

    #[error("no data for '{symbol}': {source}")]
    Unavailable {
        symbol: String,
        #[source]
        source: DataError,
    },

    #[error("no cached data for '{symbol}' and no provider configured")]
    NoProvider { symbol: String },
}

/// Options controlling how series are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Bars requested per symbol (at least the longest indicator lookback).
    pub lookback_days: usize,
    /// Point-in-time date; no bar after it is ever returned.
    pub as_of: NaiveDate,
    /// Day directory the series cache reads and writes.
    pub cache_day: NaiveDate,
    /// If true, never make network requests.
    pub offline: bool,
    /// If true, generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
    /// Skip the cache read (still writes fresh fetches).
    pub fresh: bool,
}

/// One loaded series plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub series: PriceSeries,
    pub source: DataSource,
}

/// Per-symbol loader shared by every scan worker.
pub struct SeriesLoader<'a> {
    cache: Option<&'a SeriesCache>,
    provider: Option<&'a dyn SeriesProvider>,
    opts: LoadOptions,
}

impl<'a> SeriesLoader<'a> {
    pub fn new(
        cache: Option<&'a SeriesCache>,
        provider: Option<&'a dyn SeriesProvider>,
        opts: LoadOptions,
    ) -> Self {
        Self {
            cache,
            provider,
            opts,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.opts
    }

    /// Resolve `ticker` through cache → provider → synthetic.
    pub fn load(&self, ticker: &str) -> Result<LoadedSeries, LoadError> {
        let opts = &self.opts;

        // Step 1: Try cache
        let mut short_cached = None;
        if !opts.fresh {
            if let Some(cached) = self
                .cache
                .and_then(|c| c.get(ticker, opts.cache_day, opts.as_of))
            {
                match window(&cached, opts.lookback_days, opts.as_of) {
                    Ok(series) if series.len() >= opts.lookback_days => {
                        debug!(symbol = ticker, bars = series.len(), "series cache hit");
                        return Ok(LoadedSeries {
                            series,
                            source: DataSource::Cache,
                        });
                    }
                    Ok(series) => {
                        debug!(symbol = ticker, bars = series.len(), "cached series is short");
                        short_cached = Some(series);
                    }
                    Err(e) => debug!(symbol = ticker, error = %e, "cached series unusable"),
                }
            }
        }

        // Step 2: Try the provider (if not offline and one is available)
        let mut last_error = None;
        if !opts.offline {
            if let Some(provider) = self.provider.filter(|p| p.is_available()) {
                match provider.get_series(ticker, opts.lookback_days, opts.as_of) {
                    Ok(series) => {
                        if let Some(cache) = self.cache {
                            if let Err(e) = cache.put(&series, opts.cache_day, opts.as_of) {
                                warn!(symbol = ticker, error = %e, "failed to cache series");
                            }
                        }
                        return Ok(LoadedSeries {
                            series,
                            source: provider.source(),
                        });
                    }
                    Err(e) => {
                        warn!(symbol = ticker, provider = provider.name(), error = %e, "fetch failed");
                        last_error = Some(e);
                    }
                }
            }
        }

        if let Some(series) = short_cached {
            return Ok(LoadedSeries {
                series,
                source: DataSource::Cache,
            });
        }

        // Step 3: Synthetic fallback (if enabled)
        if opts.synthetic {
            debug!(symbol = ticker, "using synthetic series");
            let series = SyntheticProvider.get_series(ticker, opts.lookback_days, opts.as_of);
            return series
                .map(|series| LoadedSeries {
                    series,
                    source: DataSource::Synthetic,
                })
                .map_err(|source| LoadError::Unavailable {
                    symbol: ticker.to_string(),
                    source,
                });
        }

        // Step 4: Fail
        let symbol = ticker.to_string();
        match last_error {
            Some(source) => Err(LoadError::Unavailable { symbol, source }),
            None if opts.offline => Err(LoadError::NoCachedDataOffline { symbol }),
            None if self.provider.is_some() => Err(LoadError::Unavailable {
                symbol,
                source: DataError::CircuitBreakerTripped,
            }),
            None => Err(LoadError::NoProvider { symbol }),
        }
    }
}

/// Seeded random-walk series for demos and offline runs.
///
/// Each symbol gets its own deterministic RNG, so repeated runs produce
/// identical series and identical scan reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SeriesProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn get_series(
        &self,
        symbol: &str,
        lookback_days: usize,
        as_of: NaiveDate,
    ) -> Result<PriceSeries, DataError> {
        let bars = generate_synthetic_bars(symbol, lookback_days.max(1), as_of);
        Ok(PriceSeries::new(symbol, bars)?)
    }
}

/// `n` weekday bars ending on or before `end`, oldest first.
fn generate_synthetic_bars(symbol: &str, n: usize, end: NaiveDate) -> Vec<Bar> {
    // Deterministic seed from symbol name
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut dates = Vec::with_capacity(n);
    let mut current = end;
    while dates.len() < n {
        if !matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(current);
        }
        current -= Duration::days(1);
    }
    dates.reverse();

    let drift: f64 = rng.gen_range(-0.0005..0.0015);
    let base_volume: u64 = rng.gen_range(150_000..4_000_000);
    let mut price: f64 = rng.gen_range(30.0..400.0);

    dates
        .into_iter()
        .map(|date| {
            let daily_return: f64 = drift + rng.gen_range(-0.02..0.02);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(1.0);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = (base_volume as f64 * rng.gen_range(0.5..2.0)) as u64;
            price = close;
            Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            }
        })
        .collect()
}
