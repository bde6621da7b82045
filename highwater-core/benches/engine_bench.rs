//! Criterion benchmarks for Highwater hot paths.
//!
//! Benchmarks:
//! 1. Day loop (full backtest over a multi-instrument market)
//! 2. Rolling maximum push throughput
//! 3. High-point selection across the universe

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use highwater_core::components::{HighPointSelector, SelectorSpec, SignalSpec, StockSelector};
use highwater_core::domain::{Bar, MarketStore, PriceSeries};
use highwater_core::engine::{run_backtest, EngineConfig};
use highwater_core::indicators::RollingMax;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(id: usize, n: usize) -> PriceSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let phase = id as f64 * 0.7;
    let bars = (0..n)
        .map(|i| {
            let t = i as f64 * 0.03 + phase;
            let close = 50.0 + t.sin() * 8.0 + i as f64 * 0.01;
            let open = close * 0.998;
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                open,
                close,
                close * 1.01,
                open * 0.99,
            )
        })
        .collect();
    PriceSeries::new(format!("{id:06}"), format!("Stock {id}"), bars).unwrap()
}

fn make_store(instruments: usize, days: usize) -> MarketStore {
    MarketStore::new((0..instruments).map(|id| make_series(id, days)).collect()).unwrap()
}

// ── 1. Day loop ──────────────────────────────────────────────────────

fn bench_day_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("day_loop");
    group.sample_size(20);
    for &instruments in &[10usize, 50] {
        let store = make_store(instruments, 1_500);
        let config = EngineConfig {
            max_positions: 5,
            selector: SelectorSpec::default(),
            signal: SignalSpec::default(),
            reselect_every: Some(30),
            ..EngineConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(instruments),
            &store,
            |b, store| b.iter(|| run_backtest(black_box(store), &config)),
        );
    }
    group.finish();
}

// ── 2. Rolling max ───────────────────────────────────────────────────

fn bench_rolling_max(c: &mut Criterion) {
    let prices: Vec<f64> = make_series(0, 10_000).closes();
    c.bench_function("rolling_max_push_10k", |b| {
        b.iter(|| {
            let mut r = RollingMax::new(300);
            for &p in &prices {
                r.push(black_box(p));
            }
            r.max()
        })
    });
}

// ── 3. Selection ─────────────────────────────────────────────────────

fn bench_selection(c: &mut Criterion) {
    let store = make_store(200, 800);
    let ids = store.ids();
    let selector = HighPointSelector::default();
    c.bench_function("high_point_select_200", |b| {
        b.iter(|| selector.select_as_of(&store, &ids, black_box(700)))
    });
}

criterion_group!(benches, bench_day_loop, bench_rolling_max, bench_selection);
criterion_main!(benches);
