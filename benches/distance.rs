//! Benchmarks for distance computations.
//!
//! Exact refinement (LSH) and table construction (ADC/SDC) are dominated by
//! these kernels.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vicinal::{DistanceMetric, RandomSource};

fn random_vectors(n: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut rng = RandomSource::seed_from_u64(42);
    (0..n)
        .map(|_| (0..dim).map(|_| rng.uniform() as f32 * 2.0 - 1.0).collect())
        .collect()
}

fn bench_metrics(c: &mut Criterion) {
    for metric in [
        DistanceMetric::SquaredL2,
        DistanceMetric::L2,
        DistanceMetric::L1,
        DistanceMetric::Cosine,
    ] {
        let mut group = c.benchmark_group(format!("{metric:?}"));

        for dim in [2, 8, 64, 128, 384, 768] {
            group.throughput(Throughput::Elements(dim as u64));

            let vectors = random_vectors(2, dim);
            let a = &vectors[0];
            let b = &vectors[1];

            group.bench_with_input(BenchmarkId::from_parameter(dim), &dim, |bench, _| {
                bench.iter(|| metric.compute(black_box(a), black_box(b)));
            });
        }

        group.finish();
    }
}

fn bench_batch_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_squared_l2");

    let dim = 128;

    for n in [10, 100, 1000] {
        group.throughput(Throughput::Elements(n as u64));

        let vectors = random_vectors(n + 1, dim);
        let query = &vectors[0];
        let candidates = &vectors[1..];

        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |bench, _| {
            bench.iter(|| {
                candidates
                    .iter()
                    .map(|v| DistanceMetric::SquaredL2.compute(black_box(query), v))
                    .collect::<Vec<f32>>()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_metrics, bench_batch_distances);
criterion_main!(benches);
