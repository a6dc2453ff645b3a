//! Benchmark for complete simulation runs.
//!
//! Zero walk and drive time, so the numbers measure the boarding protocol
//! and task scheduling only.
//!
//! Run with: cargo bench --package skibus_sim --bench simulation_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use skibus_core::{EventLog, SimConfig, Stop};
use skibus_sim::{Simulation, StopPolicy};

fn benchmark_full_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(20);

    for &skiers in &[10u32, 100, 1000] {
        let config = SimConfig::new(skiers, 5, 20, 0, 0).unwrap();
        group.throughput(Throughput::Elements(u64::from(skiers)));
        group.bench_with_input(BenchmarkId::from_parameter(skiers), &config, |b, config| {
            b.iter(|| {
                let log = Arc::new(EventLog::in_memory());
                black_box(Simulation::new(*config).with_seed(7).run(log).unwrap())
            });
        });
    }

    group.finish();
}

fn benchmark_crowded_stop(c: &mut Criterion) {
    let config = SimConfig::new(500, 4, 10, 0, 0).unwrap();

    c.bench_function("crowded_stop_500_skiers", |b| {
        b.iter(|| {
            let log = Arc::new(EventLog::in_memory());
            black_box(
                Simulation::new(config)
                    .with_seed(11)
                    .with_stop_policy(StopPolicy::Fixed(Stop(3)))
                    .run(log)
                    .unwrap(),
            )
        });
    });
}

criterion_group!(benches, benchmark_full_runs, benchmark_crowded_stop);
criterion_main!(benches);
