//! SwingScan CLI — scan, universe, config, and cache commands.
//!
//! Commands:
//! - `scan`: screen a universe and print the ranked candidates
//! - `universe list` / `universe show`: built-in and TOML universes
//! - `config --default` / `config --check FILE`: print or validate a screener config
//! - `cache status` / `cache clean`: inspect and purge the per-day caches

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use swing_core::data::{
    CircuitBreaker, CsvDirProvider, SeriesCache, SeriesProvider, Universe, YahooProvider,
    DEFAULT_KEEP_DAYS,
};
use swing_core::ScreenerConfig;
use swing_runner::{
    export_candidates_csv, export_json, init_logging, run_scan, save_artifacts, LogConfig,
    LogFormat, LoadOptions, ScanKey, ScanOptions, ScanProgress, ScanReport, ScanResultCache,
    SeriesLoader,
};

/// Bars requested per symbol; comfortably above the 200-bar minimum history.
const LOOKBACK_DAYS: usize = 300;

#[derive(Parser)]
#[command(
    name = "swingscan",
    about = "SwingScan — end-of-day swing-trading screener"
)]
struct Cli {
    /// Log format: pretty, json or compact. Overrides LOG_FORMAT.
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a universe and print ranked candidates.
    Scan(ScanArgs),
    /// Inspect universes.
    Universe {
        #[command(subcommand)]
        action: UniverseAction,
    },
    /// Print the default screener config or validate a config file.
    Config {
        /// Print the default configuration as TOML.
        #[arg(long, default_value_t = false, conflicts_with = "check")]
        default: bool,

        /// Validate a TOML config file.
        #[arg(long)]
        check: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Built-in universe name or path to a universe TOML file.
    #[arg(long, default_value = "dow_30")]
    universe: String,

    /// Screener config TOML. Defaults to built-in parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Point-in-time date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    as_of: Option<String>,

    /// Scan only the first N symbols of the universe.
    #[arg(long)]
    max_stocks: Option<usize>,

    /// Worker threads (1 = sequential, 0 = one per core).
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Offline mode: no network access.
    #[arg(long, default_value_t = false)]
    offline: bool,

    /// Use synthetic data as fallback.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Ignore cached series and cached scan results.
    #[arg(long, default_value_t = false)]
    fresh: bool,

    /// Read series from `{DIR}/{SYMBOL}.csv` instead of Yahoo Finance.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Print the full report as JSON.
    #[arg(long, default_value_t = false, conflicts_with = "csv")]
    json: bool,

    /// Print candidates as CSV.
    #[arg(long, default_value_t = false)]
    csv: bool,

    /// Also save report.json and candidates.csv under this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rows shown in the table.
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Cache directory. Defaults to ./data.
    #[arg(long, default_value = "data")]
    cache_dir: PathBuf,

    /// Keep cached day directories this many days.
    #[arg(long, default_value_t = DEFAULT_KEEP_DAYS)]
    keep_days: u32,
}

#[derive(Subcommand)]
enum UniverseAction {
    /// List built-in universes.
    List,
    /// Show the members of a built-in universe or universe file.
    Show {
        /// Built-in universe name or path to a universe TOML file.
        universe: String,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached day directories and their sizes.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Remove day directories older than the retention window.
    Clean {
        /// Keep day directories from the last N days.
        #[arg(long, default_value_t = DEFAULT_KEEP_DAYS)]
        keep_days: u32,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env();
    if let Some(format) = cli.log_format {
        log_config = log_config.with_format(format);
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Scan(args) => run_scan_cmd(args),
        Commands::Universe { action } => match action {
            UniverseAction::List => run_universe_list(),
            UniverseAction::Show { universe } => run_universe_show(&universe),
        },
        Commands::Config { default, check } => run_config(default, check.as_deref()),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir),
            CacheAction::Clean {
                keep_days,
                cache_dir,
            } => run_cache_clean(&cache_dir, keep_days),
        },
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn resolve_universe(arg: &str) -> Result<Universe> {
    let path = Path::new(arg);
    if path.extension().is_some_and(|e| e == "toml") || path.exists() {
        Universe::from_file(path).with_context(|| format!("failed to load universe {arg}"))
    } else {
        Universe::builtin(arg).with_context(|| {
            format!(
                "'{arg}' is neither a universe file nor a built-in (built-ins: {})",
                Universe::builtin_names().join(", ")
            )
        })
    }
}

fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    match path {
        Some(p) => ScreenerConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(ScreenerConfig::default()),
    }
}

fn run_scan_cmd(args: ScanArgs) -> Result<()> {
    if args.offline && args.data_dir.is_none() && !args.synthetic {
        tracing::warn!("offline without --data-dir or --synthetic: only cached series are usable");
    }

    let universe = resolve_universe(&args.universe)?;
    let config = load_config(args.config.as_deref())?;
    let as_of = args
        .as_of
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--as-of must be YYYY-MM-DD")?
        .unwrap_or_else(today);
    let today = today();
    if as_of > today {
        bail!("--as-of {as_of} is in the future");
    }

    let effective = match universe.min_price {
        Some(floor) => config.with_min_price(floor),
        None => config.clone(),
    };
    effective.validate().context("invalid screener config")?;

    let series_cache = SeriesCache::new(&args.cache_dir);
    let result_cache = ScanResultCache::new(&args.cache_dir);
    if let Err(e) = series_cache.purge(today, args.keep_days) {
        tracing::warn!(error = %e, "series cache purge failed");
    }
    if let Err(e) = result_cache.purge(today, args.keep_days) {
        tracing::warn!(error = %e, "scan cache purge failed");
    }

    let key = ScanKey {
        market: universe.name.clone(),
        max_stocks: args.max_stocks,
        config_fingerprint: effective.fingerprint(),
        as_of,
    };
    let use_result_cache = !args.synthetic && !args.fresh;
    let cached = if use_result_cache {
        result_cache.get(&key).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable cached scan");
            None
        })
    } else {
        None
    };

    let report = match cached {
        Some(report) => {
            tracing::info!(market = %report.market, "using cached scan");
            report
        }
        None => {
            let cancel = Arc::new(AtomicBool::new(false));
            watch_interrupt(Arc::clone(&cancel))?;
            let report = scan_universe(
                &args,
                &config,
                &universe,
                &series_cache,
                as_of,
                today,
                &cancel,
            )?;
            if use_result_cache && !report.was_cancelled() {
                if let Err(e) = result_cache.put(&key, &report) {
                    tracing::warn!(error = %e, "failed to cache scan result");
                }
            }
            report
        }
    };

    if let Some(dir) = &args.output {
        let run_dir = save_artifacts(&report, dir)?;
        eprintln!("Artifacts saved to: {}", run_dir.display());
    }

    if args.json {
        println!("{}", export_json(&report)?);
    } else if args.csv {
        print!("{}", export_candidates_csv(&report.candidates)?);
    } else {
        print_table(&report, args.top);
    }
    Ok(())
}

fn scan_universe(
    args: &ScanArgs,
    config: &ScreenerConfig,
    universe: &Universe,
    series_cache: &SeriesCache,
    as_of: NaiveDate,
    today: NaiveDate,
    cancel: &AtomicBool,
) -> Result<ScanReport> {
    let provider: Option<Box<dyn SeriesProvider>> = match (&args.data_dir, args.offline) {
        (Some(dir), _) => Some(Box::new(CsvDirProvider::new(dir))),
        (None, true) => None,
        (None, false) => {
            let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
            Some(Box::new(YahooProvider::new(circuit_breaker)?))
        }
    };

    let loader = SeriesLoader::new(
        Some(series_cache),
        provider.as_deref(),
        LoadOptions {
            lookback_days: LOOKBACK_DAYS,
            as_of,
            cache_day: today,
            offline: args.offline,
            synthetic: args.synthetic,
            fresh: args.fresh,
        },
    );
    let opts = ScanOptions {
        max_stocks: args.max_stocks,
        threads: args.threads,
    };

    let show_progress = !args.json && !args.csv;
    let on_progress = |p: &ScanProgress| {
        eprint!("\rScanning {:>3}/{:<3} {:<12}", p.completed, p.total, p.symbol);
    };
    let progress: Option<&(dyn Fn(&ScanProgress) + Sync)> =
        if show_progress { Some(&on_progress) } else { None };

    let report = run_scan(config, universe, &loader, &opts, progress, Some(cancel))?;
    if show_progress {
        eprintln!();
    }
    if report.was_cancelled() {
        tracing::warn!(
            skipped = report.stats.skipped_cancelled,
            "scan interrupted; partial results are not cached"
        );
    }
    Ok(report)
}

/// Set `cancel` on the first Ctrl-C so the scan stops scheduling symbols.
/// A second Ctrl-C exits immediately.
fn watch_interrupt(cancel: Arc<AtomicBool>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                cancel.store(true, Ordering::SeqCst);
                eprintln!("\nInterrupted: finishing in-flight symbols (Ctrl-C again to abort)");
                if tokio::signal::ctrl_c().await.is_ok() {
                    std::process::exit(130);
                }
            });
        })
        .context("failed to spawn signal watcher")?;
    Ok(())
}

fn print_table(report: &ScanReport, top: usize) {
    println!();
    println!(
        "=== {} as of {} — {} candidate(s) ===",
        report.market,
        report.as_of,
        report.candidates.len()
    );
    if report.synthetic {
        println!("WARNING: Results based on SYNTHETIC data");
    }

    if !report.candidates.is_empty() {
        println!();
        println!(
            "{:>4} {:<10} {:<24} {:>5} {:>9} {:>9} {:>9} {:>9} {:>5} {:<20} {:>5}",
            "Rank", "Symbol", "Company", "Score", "Close", "Entry", "Stop", "Target", "R:R",
            "Signals", "RSI"
        );
        println!("{}", "-".repeat(121));
        for (i, c) in report.top(top).iter().enumerate() {
            let signals: Vec<&str> = c.signals.active().iter().map(|k| k.label()).collect();
            let rsi = c
                .latest
                .rsi
                .map(|r| format!("{r:.0}"))
                .unwrap_or_else(|| "-".into());
            println!(
                "{:>4} {:<10} {:<24} {:>5} {:>9.2} {:>9.2} {:>9.2} {:>9.2} {:>5.2} {:<20} {:>5}",
                i + 1,
                c.symbol,
                truncate(&c.company, 24),
                c.score,
                c.latest.close,
                c.levels.entry,
                c.levels.stop_loss,
                c.levels.primary_target(),
                c.levels.risk_reward,
                signals.join(" "),
                rsi
            );
        }
        if report.candidates.len() > top {
            println!("... {} more (use --top)", report.candidates.len() - top);
        }
    }

    let s = &report.stats;
    println!();
    println!(
        "Scanned {}/{} | qualified {} | filtered {} | too few signals {} | no levels {} | errors {}",
        s.scanned,
        s.total,
        s.qualified,
        s.filtered,
        s.insufficient_signals,
        s.indeterminate_levels,
        s.errored
    );
    if s.skipped_cancelled > 0 {
        println!("Cancelled: {} symbol(s) not scanned", s.skipped_cancelled);
    }
    println!();
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width - 1).collect();
        out.push('…');
        out
    }
}

fn run_universe_list() -> Result<()> {
    for name in Universe::builtin_names() {
        let universe = Universe::builtin(name)?;
        println!("{name:<12} {:<6} {} symbols", universe.market, universe.len());
    }
    Ok(())
}

fn run_universe_show(arg: &str) -> Result<()> {
    let universe = resolve_universe(arg)?;
    println!("{} ({}) — {} symbols", universe.name, universe.market, universe.len());
    if let Some(floor) = universe.min_price {
        println!("Minimum price: {floor:.2}");
    }
    println!();
    println!("{:<12} {:<14} {:<32} {}", "Symbol", "Ticker", "Company", "Industry");
    println!("{}", "-".repeat(80));
    for m in &universe.members {
        println!(
            "{:<12} {:<14} {:<32} {}",
            m.symbol,
            m.provider_ticker(),
            truncate(&m.company, 32),
            m.industry
        );
    }
    Ok(())
}

fn run_config(default: bool, check: Option<&Path>) -> Result<()> {
    match (default, check) {
        (_, Some(path)) => {
            let config = ScreenerConfig::from_file(path)
                .with_context(|| format!("{} is not a valid config", path.display()))?;
            println!("OK: {} (fingerprint {})", path.display(), config.fingerprint());
            Ok(())
        }
        (true, None) => {
            print!("{}", ScreenerConfig::default().to_toml()?);
            Ok(())
        }
        (false, None) => bail!("pass --default or --check FILE"),
    }
}

fn run_cache_status(cache_dir: &Path) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    println!("Cache: {}", cache_dir.display());
    println!();
    println!("{:<8} {:<12} {:>7} {:>10}", "Kind", "Day", "Files", "Size");
    println!("{}", "-".repeat(40));
    for kind in ["series", "scans"] {
        let dir = cache_dir.join(kind);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        let mut days: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        days.sort();
        for day in days {
            let (files, size) = dir_stats(&day);
            let name = day
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            println!("{kind:<8} {name:<12} {files:>7} {:>10}", format_size(size));
        }
    }
    Ok(())
}

fn run_cache_clean(cache_dir: &Path, keep_days: u32) -> Result<()> {
    let today = today();
    let series = SeriesCache::new(cache_dir).purge(today, keep_days)?;
    let scans = ScanResultCache::new(cache_dir).purge(today, keep_days)?;
    println!(
        "Removed {series} series day(s) and {scans} scan day(s) older than {keep_days} days."
    );
    Ok(())
}

fn dir_stats(path: &Path) -> (usize, u64) {
    let mut files = 0;
    let mut size = 0u64;
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                files += 1;
                size += meta.len();
            }
        }
    }
    (files, size)
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
