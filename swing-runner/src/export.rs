//! Export — JSON and CSV renditions of a scan report.
//!
//! - **JSON**: the full `ScanReport`, round-trippable, with schema versioning
//! - **CSV**: one row per ranked candidate for spreadsheets
//!
//! Persisted reports carry a `schema_version` field. Newer versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use swing_core::Candidate;

use crate::report::{ScanReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `ScanReport` to pretty JSON.
pub fn export_json(report: &ScanReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize ScanReport to JSON")
}

/// Deserialize a `ScanReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ScanReport> {
    let report: ScanReport =
        serde_json::from_str(json).context("failed to deserialize ScanReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export ranked candidates as CSV.
///
/// Columns: rank, symbol, company, industry, score, signal_count, signals,
/// close, rsi, entry, stop_loss, target, all_targets, risk_reward, supports,
/// resistances
pub fn export_candidates_csv(candidates: &[Candidate]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "rank",
        "symbol",
        "company",
        "industry",
        "score",
        "signal_count",
        "signals",
        "close",
        "rsi",
        "entry",
        "stop_loss",
        "target",
        "all_targets",
        "risk_reward",
        "supports",
        "resistances",
    ])?;

    for (i, c) in candidates.iter().enumerate() {
        let signals: Vec<&str> = c.signals.active().iter().map(|k| k.label()).collect();
        wtr.write_record([
            &(i + 1).to_string(),
            &c.symbol,
            &c.company,
            &c.industry,
            &c.score.to_string(),
            &c.signal_count.to_string(),
            &signals.join(" "),
            &format!("{:.2}", c.latest.close),
            &c.latest.rsi.map(|r| format!("{r:.1}")).unwrap_or_default(),
            &format!("{:.2}", c.levels.entry),
            &format!("{:.2}", c.levels.stop_loss),
            &format!("{:.2}", c.levels.primary_target()),
            &join_prices(&c.levels.targets),
            &format!("{:.2}", c.levels.risk_reward),
            &join_prices(&c.supports),
            &join_prices(&c.resistances),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn join_prices(prices: &[f64]) -> String {
    prices
        .iter()
        .map(|p| format!("{p:.2}"))
        .collect::<Vec<_>>()
        .join(";")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save `report.json` and `candidates.csv` for a scan.
///
/// Creates `{market}_{as_of}/` under `output_dir` and returns its path.
pub fn save_artifacts(report: &ScanReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("{}_{}", report.market, report.as_of.format("%Y-%m-%d"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("candidates.csv"),
        export_candidates_csv(&report.candidates)?,
    )?;

    Ok(run_dir)
}

/// Load a `ScanReport` from an artifact directory's report.json.
pub fn load_artifacts(dir: &Path) -> Result<ScanReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ScanStats;
    use chrono::NaiveDate;

    fn empty_report() -> ScanReport {
        ScanReport {
            schema_version: SCHEMA_VERSION,
            market: "dow_30".into(),
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
            config_fingerprint: "abc123".into(),
            synthetic: true,
            candidates: vec![],
            stats: ScanStats::new(30),
        }
    }

    #[test]
    fn json_round_trip() {
        let report = empty_report();
        let json = export_json(&report).unwrap();
        assert!(json.contains("\"schema_version\": 1"));
        assert_eq!(import_json(&json).unwrap(), report);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut report = empty_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn empty_csv_has_header_only() {
        let csv = export_candidates_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("rank,symbol,company"));
    }

    #[test]
    fn artifacts_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let report = empty_report();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();
        assert!(run_dir.ends_with("dow_30_2024-06-28"));
        assert!(run_dir.join("candidates.csv").exists());
        assert_eq!(load_artifacts(&run_dir).unwrap(), report);
    }
}
