use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use driftsense::drift::BatchDriftDetector;
use driftsense::semi_supervised::{MarginDensityConfig, MarginDensityDetector};
use driftsense::training::{KernelType, SVMClassifier, SVMConfig};
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn create_column(n_rows: usize, shift: f64) -> Array1<f64> {
    let mut rng = rand::thread_rng();
    (0..n_rows).map(|_| rng.gen::<f64>() * 10.0 + shift).collect()
}

fn create_labeled_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = rand::thread_rng();
    let y: Array1<f64> = (0..n_rows).map(|i| (i % 2) as f64).collect();
    let x = Array2::from_shape_fn((n_rows, n_features), |(i, _)| {
        rng.gen::<f64>() * 2.0 - 1.0 + if y[i] > 0.5 { 0.8 } else { -0.8 }
    });
    (x, y)
}

fn linear_svm() -> SVMClassifier {
    SVMClassifier::new(SVMConfig {
        kernel: KernelType::Linear,
        max_iter: 100,
        ..Default::default()
    })
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    for n_rows in [100, 1000, 5000].iter() {
        let reference = create_column(*n_rows, 0.0);
        let incoming = create_column(*n_rows, 0.5);

        let mut ks = BatchDriftDetector::kolmogorov_smirnov();
        ks.fit_column(&reference).unwrap();
        group.bench_with_input(BenchmarkId::new("ks", n_rows), &incoming, |b, incoming| {
            b.iter(|| ks.compare_column(black_box(incoming)).unwrap())
        });

        let mut kl = BatchDriftDetector::kullback_leibler(20);
        kl.fit_column(&reference).unwrap();
        group.bench_with_input(BenchmarkId::new("kl", n_rows), &incoming, |b, incoming| {
            b.iter(|| kl.compare_column(black_box(incoming)).unwrap())
        });
    }

    group.finish();
}

fn bench_margin_density(c: &mut Criterion) {
    let mut group = c.benchmark_group("margin_density");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [100, 300].iter() {
        let (x, y) = create_labeled_data(*n_rows, 4);
        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                let config = MarginDensityConfig::new(50, 2.0, 5).unwrap();
                let mut detector = MarginDensityDetector::new(config, linear_svm as fn() -> SVMClassifier).unwrap();
                detector.fit(black_box(x), black_box(y)).unwrap()
            })
        });
    }

    let (x, y) = create_labeled_data(200, 4);
    let config = MarginDensityConfig::new(50, 2.0, 5).unwrap();
    let mut detector = MarginDensityDetector::new(config, linear_svm as fn() -> SVMClassifier).unwrap();
    detector.fit(&x, &y).unwrap();
    let (stream, _) = create_labeled_data(50, 4);
    group.bench_function("predict_chunk", |b| {
        b.iter(|| {
            if detector.drift_suspected() {
                detector.fit(&x, &y).unwrap();
            }
            detector.predict(black_box(&stream)).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_batch, bench_margin_density);
criterion_main!(benches);
