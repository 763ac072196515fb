use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use temporal_ingress::{
    CollectingSink, CompletionPolicy, DisorderPolicy, FlushPolicy, IngressConfig, IngressEngine,
    ReorderStrategy, StreamEvent, Timestamp,
};

/// Generate sync times where a fraction of events arrive up to `max_delay` late
fn generate_times(count: usize, disorder_ratio: f64, max_delay: i64, seed: u64) -> Vec<Timestamp> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count as i64)
        .map(|i| {
            if rng.gen_bool(disorder_ratio) {
                i - rng.gen_range(0..max_delay)
            } else {
                i
            }
        })
        .collect()
}

fn config(strategy: ReorderStrategy, slack: i64) -> IngressConfig {
    IngressConfig::new()
        .with_disorder(DisorderPolicy::Drop(slack))
        .with_flush(FlushPolicy::None)
        .with_completion(CompletionPolicy::EndOfStream)
        .with_strategy(strategy)
}

/// Benchmark: Reorder throughput per strategy with increasing disorder
fn benchmark_strategy_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("reorder_throughput");
    group.sample_size(10);

    let count = 100_000;
    group.throughput(Throughput::Elements(count as u64));

    for disorder_ratio in [0.0, 0.1, 0.5] {
        let times = generate_times(count, disorder_ratio, 200, 42);
        for strategy in [ReorderStrategy::ImpatienceWindow, ReorderStrategy::PriorityQueue] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), disorder_ratio),
                &times,
                |b, times| {
                    b.iter(|| {
                        let mut engine: IngressEngine<(), u64, CollectingSink<(), u64>> =
                            IngressEngine::new(config(strategy, 202), CollectingSink::new())
                                .unwrap();
                        for (index, &time) in times.iter().enumerate() {
                            engine
                                .push(StreamEvent::start(time, index as u64))
                                .unwrap();
                        }
                        engine.complete_all();
                        black_box(engine.into_sink().batches.len())
                    });
                },
            );
        }
    }

    group.finish();
}

/// Benchmark: Cost of a growing slack on a fixed workload
fn benchmark_slack_sensitivity(c: &mut Criterion) {
    let mut group = c.benchmark_group("slack_sensitivity");
    group.sample_size(10);

    let times = generate_times(50_000, 0.5, 1_000, 7);
    for slack in [10, 100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(slack), &slack, |b, &slack| {
            b.iter_custom(|iters| {
                let start = Instant::now();
                for _ in 0..iters {
                    let mut engine: IngressEngine<(), u64, CollectingSink<(), u64>> =
                        IngressEngine::new(
                            config(ReorderStrategy::ImpatienceWindow, slack),
                            CollectingSink::new(),
                        )
                        .unwrap();
                    for (index, &time) in times.iter().enumerate() {
                        engine
                            .push(black_box(StreamEvent::start(time, index as u64)))
                            .unwrap();
                    }
                    engine.complete_all();
                }
                start.elapsed()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_strategy_throughput,
    benchmark_slack_sensitivity
);
criterion_main!(benches);
