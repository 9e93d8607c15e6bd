//! Price data: providers, the per-day series cache, and universes.

pub mod cache;
pub mod circuit_breaker;
pub mod csv_provider;
pub mod provider;
pub mod universe;
pub mod yahoo;

pub use cache::{purge_day_dirs, SeriesCache, DEFAULT_KEEP_DAYS};
pub use circuit_breaker::CircuitBreaker;
pub use csv_provider::CsvDirProvider;
pub use provider::{DataError, DataSource, SeriesProvider};
pub use universe::{Listing, Universe, UniverseError};
pub use yahoo::YahooProvider;
