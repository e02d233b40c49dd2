// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Single-handle region microbenchmarks.
//!
//! Uncontended lock cost, header operations and payload copies at several
//! sizes, for both backends.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shmlink_core::{BackendKind, Region, RegionOptions};

/// Payload sizes to benchmark (in bytes).
const PAYLOAD_SIZES: &[usize] = &[16, 256, 4096, 65536];

const BACKENDS: [BackendKind; 2] = [BackendKind::Posix, BackendKind::Sysv];

fn create(tag: &str, backend: BackendKind, payload: usize) -> Region {
    let name = format!("crit-{}-{}-{}", tag, backend, std::process::id());
    Region::create_with(&name, payload, RegionOptions::new().backend(backend))
        .expect("Failed to create region")
}

fn bench_lock_unlock(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_unlock");

    for backend in BACKENDS {
        let region = create("lock", backend, 0);
        group.bench_function(BenchmarkId::from_parameter(backend), |b| {
            b.iter(|| {
                let guard = region.lock().expect("lock failed");
                guard.unlock().expect("unlock failed");
            });
        });
    }

    group.finish();
}

fn bench_header_ops(c: &mut Criterion) {
    let mut group = c.benchmark_group("header");

    for backend in BACKENDS {
        let region = create("header", backend, 0);
        group.bench_function(BenchmarkId::new("put_scalar", backend), |b| {
            b.iter(|| region.put_scalar(black_box(1.5)).expect("put failed"));
        });
        group.bench_function(BenchmarkId::new("get_scalar", backend), |b| {
            b.iter(|| black_box(region.get_scalar().expect("get failed")));
        });
        group.bench_function(BenchmarkId::new("time_since_last_update", backend), |b| {
            b.iter(|| black_box(region.time_since_last_update().expect("read failed")));
        });
    }

    group.finish();
}

fn bench_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");
    group.measurement_time(Duration::from_secs(5));

    for backend in BACKENDS {
        for &size in PAYLOAD_SIZES {
            group.throughput(Throughput::Bytes(size as u64));
            let region = create(&format!("payload{}", size), backend, size);
            let src = vec![0xABu8; size];
            let mut dst = vec![0u8; size];

            group.bench_with_input(
                BenchmarkId::new(format!("put/{}", backend), size),
                &size,
                |b, _| b.iter(|| region.put_payload(black_box(&src)).expect("put failed")),
            );
            group.bench_with_input(
                BenchmarkId::new(format!("get/{}", backend), size),
                &size,
                |b, _| b.iter(|| region.get_payload(black_box(&mut dst)).expect("get failed")),
            );
        }
    }

    group.finish();
}

/// CRC32 as used by `shmlink inspect`.
fn bench_crc32(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc32");

    for &size in PAYLOAD_SIZES {
        group.throughput(Throughput::Bytes(size as u64));
        let payload = vec![0xABu8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(crc32fast::hash(black_box(&payload))));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_lock_unlock,
    bench_header_ops,
    bench_payload,
    bench_crc32,
);

criterion_main!(benches);
