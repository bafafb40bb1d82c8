//! Benchmarks for the reflector kernel pipeline
//!
//! Compares the host reference against the simulated device path across
//! problem sizes, and measures the end-to-end correctness evaluation the
//! harness performs per run.
//!
//! # Benchmark Methodology
//!
//! - Tests multiple vector sizes: 100, 1000, 10000 elements
//! - Uses Criterion for statistical analysis
//! - Each benchmark measures throughput (elements/second)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use comprobar::driver::DeviceContext;
use comprobar::harness::{measure_error, ReflectorData, RunConfig};
use comprobar::kernels::SimLarfg;
use comprobar::reference::{larfg, NativeReflector};

/// Generate test data for benchmarks
fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size).map(|i| 1.0 + (i % 9) as f64).collect()
}

/// Benchmark the host reference alone
fn bench_host_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_reference");

    for size in [100usize, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("larfg", size), size, |bencher, &size| {
            let data = generate_test_data(size - 1);
            bencher.iter(|| {
                let mut alpha = 3.0f64;
                let mut x = data.clone();
                black_box(larfg(size as i64, &mut alpha, &mut x, 1));
            });
        });
    }

    group.finish();
}

/// Benchmark the full correctness evaluation (generate, upload, launch,
/// transfer back, reference, norm)
fn bench_correctness_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("correctness_pipeline");

    for size in [100i64, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::new("evaluate", size), size, |bencher, &size| {
            let ctx = DeviceContext::new();
            let cfg = RunConfig::new(size, 1).with_checks(true, false);
            let kernel = SimLarfg::new();
            let mut data = ReflectorData::<f64>::allocate(&ctx, &cfg).unwrap();

            bencher.iter(|| {
                black_box(
                    measure_error(&kernel, &NativeReflector, &ctx, &cfg, &mut data).unwrap(),
                );
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_host_reference, bench_correctness_pipeline);
criterion_main!(benches);
