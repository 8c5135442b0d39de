//! Benchmark k-NN imputation and the variance filter across matrix shapes
//!
//! Run with: cargo bench --bench impute_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand::SeedableRng;

use duoscore::pipeline::{apply_variance_filter, FeatureMatrix, KnnImputer};

/// Random matrix where roughly `missing_rate` of the cells are NaN
fn generate_matrix(n_rows: usize, n_features: usize, missing_rate: f64, seed: u64) -> FeatureMatrix {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let names: Vec<String> = (0..n_features).map(|i| i.to_string()).collect();
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|_| {
            (0..n_features)
                .map(|j| {
                    if rng.gen::<f64>() < missing_rate {
                        f64::NAN
                    } else if j % 10 == 9 {
                        // Near-constant column for the variance filter
                        1.0 + rng.gen::<f64>() * 0.01
                    } else {
                        rng.gen::<f64>() * 10.0
                    }
                })
                .collect()
        })
        .collect();

    FeatureMatrix::from_rows(names, &rows).expect("Failed to create matrix")
}

/// Imputation cost as rows and columns grow
fn benchmark_imputation_by_shape(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_imputation");
    group.sample_size(10);

    let shapes = [(200, 50), (500, 100), (1_000, 200)];

    for (n_rows, n_features) in shapes {
        let matrix = generate_matrix(n_rows, n_features, 0.02, 42);
        group.throughput(Throughput::Elements(matrix.missing_count() as u64));

        group.bench_with_input(
            BenchmarkId::new("k5", format!("{}x{}", n_rows, n_features)),
            &matrix,
            |b, matrix| {
                b.iter(|| {
                    let _ = KnnImputer::new(5).impute(black_box(matrix));
                });
            },
        );
    }

    group.finish();
}

/// Imputation cost as more neighbours are consulted
fn benchmark_imputation_by_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("knn_neighbors");
    group.sample_size(10);

    let matrix = generate_matrix(500, 100, 0.05, 7);
    for k in [1, 5, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter(|| {
                let _ = KnnImputer::new(k).impute(black_box(&matrix));
            });
        });
    }

    group.finish();
}

fn benchmark_variance_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("variance_filter");

    for n_features in [100, 1_000, 3_200] {
        let matrix = generate_matrix(1_000, n_features, 0.0, 42);
        group.throughput(Throughput::Elements(n_features as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(n_features),
            &matrix,
            |b, matrix| {
                b.iter(|| {
                    let _ = apply_variance_filter(black_box(matrix), black_box(0.01));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_imputation_by_shape,
    benchmark_imputation_by_neighbors,
    benchmark_variance_filter
);
criterion_main!(benches);
