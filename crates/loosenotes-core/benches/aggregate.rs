//! Aggregate Recompute Benchmark
//!
//! Measures folding a note's rating values into the cached aggregate, which
//! runs inside every rating write's critical section.
//!
//! This benchmark tests:
//! - RatingAggregate::from_values over growing rating sets
//! - RatingAggregate::from_totals (the SUM/COUNT path used by PostgreSQL)

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use loosenotes_core::RatingAggregate;
use rand::Rng;

fn random_values(count: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen_range(1..=5)).collect()
}

fn bench_from_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_from_values");

    for size in [10usize, 1_000, 100_000] {
        let values = random_values(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| RatingAggregate::from_values(black_box(values).iter().copied()))
        });
    }

    group.finish();
}

fn bench_from_totals(c: &mut Criterion) {
    c.bench_function("aggregate_from_totals", |b| {
        b.iter(|| RatingAggregate::from_totals(black_box(347_129), black_box(100_003)))
    });
}

criterion_group!(benches, bench_from_values, bench_from_totals);
criterion_main!(benches);
