//! Criterion benchmarks for screening hot paths.
//!
//! Benchmarks:
//! 1. Indicator snapshot (all series for one symbol)
//! 2. Support/resistance detection
//! 3. Full per-symbol evaluation (snapshot + gate + signals + levels + score)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use swing_core::config::{IndicatorParams, ScreenerConfig};
use swing_core::data::Listing;
use swing_core::domain::{Bar, PriceSeries};
use swing_core::indicators::{find_levels, IndicatorSnapshot};
use swing_core::Screener;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + i as f64 * 0.05 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: close + 1.5,
                low: open - 1.5,
                close,
                volume: 1_000_000 + (i as u64 % 500_000),
            }
        })
        .collect();
    PriceSeries::new("BENCH", bars).unwrap()
}

// ── 1. Indicator snapshot ────────────────────────────────────────────

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_snapshot");
    let params = IndicatorParams::default();

    for &bar_count in &[252, 500, 1260] {
        let series = make_series(bar_count);
        group.bench_with_input(BenchmarkId::new("compute", bar_count), &bar_count, |b, _| {
            b.iter(|| IndicatorSnapshot::compute(black_box(&series), black_box(&params)));
        });
    }

    group.finish();
}

// ── 2. Support/resistance ────────────────────────────────────────────

fn bench_levels(c: &mut Criterion) {
    let series = make_series(500);
    c.bench_function("find_levels_60", |b| {
        b.iter(|| find_levels(black_box(series.bars()), 60, 5, 0.015));
    });
}

// ── 3. Full evaluation ───────────────────────────────────────────────

fn bench_evaluate(c: &mut Criterion) {
    let screener = Screener::new(ScreenerConfig::default()).unwrap();
    let listing = Listing::new("BENCH", "Bench Corp", "Benchmarks");
    let series = make_series(500);

    c.bench_function("evaluate_500_bars", |b| {
        b.iter(|| screener.evaluate(black_box(&listing), black_box(&series)));
    });
}

criterion_group!(benches, bench_snapshot, bench_levels, bench_evaluate);
criterion_main!(benches);
