//! benches/market_tick.rs
//! Run with:  cargo bench --bench market_tick
//! HTML:      target/criterion/report/index.html

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;
use trading_arena::{
    AgentSpec, EngineSettings, Market, MarketModel, ModeConfig, Trader, TrendFollowingModel,
    TurnDate, modes, settlement,
};

// ────────────────────────────────────────────────────────────────────────────
//  Parameter grids
// ────────────────────────────────────────────────────────────────────────────
const MODES: &[&str] = &["stocks", "crypto"];
const TICKS_PER_ITER: usize = 12;

fn settings() -> EngineSettings {
    EngineSettings {
        seed: Some(42),
        ..EngineSettings::default()
    }
}

/// One simulated year of a built-in mode, all agents on the local policy.
pub fn bench_market_year(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_year");
    group.throughput(Throughput::Elements(TICKS_PER_ITER as u64));

    for &name in MODES {
        let mode: ModeConfig = match modes::builtin(name) {
            Ok(mode) => mode,
            Err(_) => continue,
        };
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter_batched(
                || Market::new(mode.clone(), settings()).ok(),
                |market| {
                    if let Some(mut market) = market {
                        for _ in 0..TICKS_PER_ITER {
                            black_box(market.step());
                        }
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Price evolution alone over the stocks roster.
pub fn bench_model_evolve(c: &mut Criterion) {
    let Ok(mode) = modes::builtin("stocks") else {
        return;
    };
    let book = trading_arena::InstrumentBook::from_specs(&mode.instruments);
    let model = TrendFollowingModel::default();
    let mut rng = StdRng::seed_from_u64(7);
    let date = TurnDate::new(2010, 6);

    c.bench_function("model_evolve_roster", |b| {
        b.iter(|| {
            let trend = model.market_trend(None, &mut rng);
            for inst in book.iter() {
                black_box(model.evolve(inst, trend, None, date, &mut rng));
            }
        })
    });
}

/// A buy and the matching sell against a fresh book.
pub fn bench_settlement(c: &mut Criterion) {
    let Ok(mode) = modes::builtin("stocks") else {
        return;
    };
    let date = TurnDate::new(2010, 6);
    let spec = AgentSpec::new("Bench", "local", "balanced", "#fff");

    c.bench_function("settle_buy_then_sell", |b| {
        b.iter_batched(
            || {
                (
                    Trader::new(1, &spec, 1_000_000.0),
                    trading_arena::InstrumentBook::from_specs(&mode.instruments),
                )
            },
            |(mut trader, mut book)| {
                black_box(settlement::apply(&mut trader, "BUY MSFT 100", &mut book, date));
                black_box(settlement::apply(&mut trader, "SELL MSFT 100", &mut book, date));
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_market_year, bench_model_evolve, bench_settlement);
criterion_main!(benches);
