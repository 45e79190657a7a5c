//! Export throughput into the in-memory cache.
//!
//! Run with: `cargo bench --package hoard-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hoard_bench::{BenchmarkConfig, memory_manager, run_export};
use std::time::Duration;

fn benchmark_configs() -> Vec<(&'static str, BenchmarkConfig)> {
    vec![
        (
            "64KiB/4KiB",
            BenchmarkConfig {
                total_bytes: 64 * 1024,
                chunk_size: 4 * 1024,
            },
        ),
        (
            "1MiB/8KiB",
            BenchmarkConfig {
                total_bytes: 1024 * 1024,
                chunk_size: 8 * 1024,
            },
        ),
        (
            "1MiB/64KiB",
            BenchmarkConfig {
                total_bytes: 1024 * 1024,
                chunk_size: 64 * 1024,
            },
        ),
    ]
}

fn export_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("export");
    group.measurement_time(Duration::from_secs(10));

    for (name, config) in benchmark_configs() {
        group.throughput(Throughput::Bytes(config.total_bytes as u64));
        group.bench_with_input(BenchmarkId::new("memory", name), &config, |b, config| {
            b.to_async(&runtime).iter(|| async move {
                let manager = memory_manager();
                let status = run_export(&manager, config.chunks()).await.unwrap();
                assert!(status.is_finished());
            });
        });
    }

    group.finish();
}

fn cancel_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = BenchmarkConfig {
        total_bytes: 1024 * 1024,
        chunk_size: 1024,
    };

    c.bench_function("export/start_then_cancel", |b| {
        b.to_async(&runtime).iter(|| async move {
            let manager = memory_manager();
            let user = hoard_lib::User::new("bench", ["exporter"]);
            let source = hoard_lib::ExportSource::from_chunks(config.chunks());
            let status = manager.start_export(&user, source).await.unwrap();
            let _ = manager.cancel_export(&status.id).await;
        });
    });
}

criterion_group!(benches, export_benchmark, cancel_benchmark);
criterion_main!(benches);
