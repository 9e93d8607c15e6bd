//! Per-day scan-result cache.
//!
//! Layout: `{root}/scans/{YYYY-MM-DD}/{market}_{scope}_{fingerprint}.json`,
//! where the date is the scan's as-of date, `scope` is `all` or `top{N}`
//! (the `--max-stocks` limit) and the fingerprint is the first 16 hex
//! characters of the config fingerprint. A repeated scan with the same
//! inputs on the same day is served from disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::debug;

use swing_core::data::purge_day_dirs;

use crate::export::{export_json, import_json};
use crate::report::ScanReport;

/// Identifies one cached scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanKey {
    pub market: String,
    pub max_stocks: Option<usize>,
    pub config_fingerprint: String,
    pub as_of: NaiveDate,
}

impl ScanKey {
    fn file_name(&self) -> String {
        let scope = match self.max_stocks {
            Some(n) => format!("top{n}"),
            None => "all".to_string(),
        };
        let fp = &self.config_fingerprint[..self.config_fingerprint.len().min(16)];
        format!("{}_{scope}_{fp}.json", self.market)
    }
}

#[derive(Debug, Clone)]
pub struct ScanResultCache {
    root: PathBuf,
}

impl ScanResultCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn scans_dir(&self) -> PathBuf {
        self.root.join("scans")
    }

    fn result_path(&self, key: &ScanKey) -> PathBuf {
        self.scans_dir()
            .join(key.as_of.format("%Y-%m-%d").to_string())
            .join(key.file_name())
    }

    /// Retrieves a cached report.
    ///
    /// Returns `None` if nothing is cached for the key.
    pub fn get(&self, key: &ScanKey) -> Result<Option<ScanReport>> {
        let path = self.result_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)
            .with_context(|| format!("failed to read cached scan {}", path.display()))?;
        let report = import_json(&json)
            .with_context(|| format!("failed to load cached scan {}", path.display()))?;
        debug!(path = %path.display(), "scan cache hit");
        Ok(Some(report))
    }

    /// Stores a report under `key`.
    pub fn put(&self, key: &ScanKey, report: &ScanReport) -> Result<()> {
        let path = self.result_path(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("failed to create scan cache directory")?;
        }
        let json = export_json(report)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).context("failed to write cached scan")?;
        fs::rename(&tmp_path, &path).context("failed to move cached scan into place")?;
        Ok(())
    }

    /// Removes day directories older than `keep_days` before `today`.
    pub fn purge(&self, today: NaiveDate, keep_days: u32) -> Result<usize> {
        purge_day_dirs(&self.scans_dir(), today, keep_days).context("failed to purge scan cache")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ScanStats, SCHEMA_VERSION};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn key(as_of: NaiveDate) -> ScanKey {
        ScanKey {
            market: "dow_30".into(),
            max_stocks: Some(10),
            config_fingerprint: "0123456789abcdef0123".into(),
            as_of,
        }
    }

    fn report(as_of: NaiveDate) -> ScanReport {
        ScanReport {
            schema_version: SCHEMA_VERSION,
            market: "dow_30".into(),
            as_of,
            config_fingerprint: "0123456789abcdef0123".into(),
            synthetic: false,
            candidates: vec![],
            stats: ScanStats::new(10),
        }
    }

    #[test]
    fn put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanResultCache::new(dir.path());
        assert!(cache.get(&key(day(28))).unwrap().is_none());

        cache.put(&key(day(28)), &report(day(28))).unwrap();
        assert_eq!(cache.get(&key(day(28))).unwrap(), Some(report(day(28))));
        assert!(dir
            .path()
            .join("scans/2024-06-28/dow_30_top10_0123456789abcdef.json")
            .exists());
    }

    #[test]
    fn scope_is_part_of_the_key() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanResultCache::new(dir.path());
        cache.put(&key(day(28)), &report(day(28))).unwrap();

        let mut all = key(day(28));
        all.max_stocks = None;
        assert!(cache.get(&all).unwrap().is_none());
    }

    #[test]
    fn purge_drops_old_days() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ScanResultCache::new(dir.path());
        cache.put(&key(day(20)), &report(day(20))).unwrap();
        cache.put(&key(day(27)), &report(day(27))).unwrap();

        assert_eq!(cache.purge(day(28), 3).unwrap(), 1);
        assert!(cache.get(&key(day(20))).unwrap().is_none());
        assert!(cache.get(&key(day(27))).unwrap().is_some());
    }
}
