//! Per-day series cache.
//!
//! Layout: `{root}/series/{FETCH_DAY}/{SYMBOL}@{AS_OF}.csv`. The directory
//! is the day the series was fetched; the file name carries the point-in-time
//! date it was fetched for, so runs with different `as_of` dates never share
//! an entry. Older day directories are purged after `keep_days`.
//!
//! Writes are atomic (write to `.tmp`, rename into place). Files that fail to
//! parse are renamed to `.quarantined` and treated as misses.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::csv_provider::{read_bars, write_bars};
use super::provider::DataError;
use crate::domain::PriceSeries;

/// Day directories older than this many days are purged by default.
pub const DEFAULT_KEEP_DAYS: u32 = 3;

pub struct SeriesCache {
    root: PathBuf,
}

impl SeriesCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn day_dir(&self, day: NaiveDate) -> PathBuf {
        self.root.join("series").join(day.format("%Y-%m-%d").to_string())
    }

    fn path_for(&self, symbol: &str, day: NaiveDate, as_of: NaiveDate) -> PathBuf {
        self.day_dir(day)
            .join(format!("{symbol}@{}.csv", as_of.format("%Y-%m-%d")))
    }

    /// Series fetched for `symbol` at `as_of` on `day`, if any.
    pub fn get(&self, symbol: &str, day: NaiveDate, as_of: NaiveDate) -> Option<PriceSeries> {
        let path = self.path_for(symbol, day, as_of);
        let file = File::open(&path).ok()?;
        let parsed = read_bars(file)
            .and_then(|bars| PriceSeries::new(symbol, bars).map_err(DataError::from));
        match parsed {
            Ok(series) => Some(series),
            Err(e) => {
                warn!(symbol, path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, path.with_extension("csv.quarantined"));
                None
            }
        }
    }

    /// Store `series` as fetched on `day` for the point-in-time date `as_of`.
    pub fn put(&self, series: &PriceSeries, day: NaiveDate, as_of: NaiveDate) -> Result<(), DataError> {
        let dir = self.day_dir(day);
        fs::create_dir_all(&dir)
            .map_err(|e| DataError::CacheError(format!("failed to create {}: {e}", dir.display())))?;

        let path = self.path_for(series.symbol(), day, as_of);
        let tmp_path = path.with_extension("csv.tmp");
        let file = File::create(&tmp_path)
            .map_err(|e| DataError::CacheError(format!("failed to create {}: {e}", tmp_path.display())))?;
        write_bars(file, series.bars())?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;
        debug!(symbol = series.symbol(), bars = series.len(), "cached series");
        Ok(())
    }

    /// Remove day directories older than `keep_days` before `today`.
    pub fn purge(&self, today: NaiveDate, keep_days: u32) -> Result<usize, DataError> {
        purge_day_dirs(&self.root.join("series"), today, keep_days)
    }
}

/// Delete `YYYY-MM-DD` subdirectories of `dir` dated before `today - keep_days`.
///
/// Entries whose names are not dates are left alone. Returns how many
/// directories were removed.
pub fn purge_day_dirs(dir: &Path, today: NaiveDate, keep_days: u32) -> Result<usize, DataError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(DataError::CacheError(format!("read {}: {e}", dir.display()))),
    };

    let cutoff = today - chrono::Duration::days(i64::from(keep_days));
    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(day) = name
            .to_str()
            .and_then(|n| NaiveDate::parse_from_str(n, "%Y-%m-%d").ok())
        else {
            continue;
        };
        if day < cutoff && entry.path().is_dir() {
            fs::remove_dir_all(entry.path())
                .map_err(|e| DataError::CacheError(format!("remove {}: {e}", entry.path().display())))?;
            removed += 1;
        }
    }
    Ok(removed)
}
