//! SwingScan Runner — scan orchestration on top of `swing-core`.
//!
//! This crate provides:
//! - Series loading with cache/provider/synthetic fallback
//! - The parallel scan driver with cancellation and progress callbacks
//! - Scan statistics and ranked reports
//! - The per-day scan-result cache
//! - JSON/CSV export
//! - Logging setup

pub mod data_loader;
pub mod export;
pub mod logging;
pub mod report;
pub mod result_cache;
pub mod scan;

pub use data_loader::{LoadError, LoadOptions, LoadedSeries, SeriesLoader, SyntheticProvider};
pub use export::{export_candidates_csv, export_json, import_json, load_artifacts, save_artifacts};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use report::{ScanReport, ScanStats, SCHEMA_VERSION};
pub use result_cache::{ScanKey, ScanResultCache};
pub use scan::{run_scan, ScanError, ScanOptions, ScanProgress};
