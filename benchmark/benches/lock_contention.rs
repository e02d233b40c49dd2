// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Lock contention scaling: N threads, one attached handle each, doing
//! locked increments on a shared payload counter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shmlink_benchmark::run_contention;
use shmlink_core::BackendKind;

const INCREMENTS_PER_THREAD: u64 = 1_000;

static RUN: AtomicUsize = AtomicUsize::new(0);

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("lock_contention");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    for backend in [BackendKind::Posix, BackendKind::Sysv] {
        for threads in [1usize, 2, 4, 8] {
            group.throughput(Throughput::Elements(threads as u64 * INCREMENTS_PER_THREAD));
            group.bench_with_input(
                BenchmarkId::new(backend.name(), threads),
                &threads,
                |b, &threads| {
                    b.iter_custom(|iters| {
                        let mut total = Duration::ZERO;
                        for _ in 0..iters {
                            let name = format!(
                                "crit-contention-{}-{}",
                                std::process::id(),
                                RUN.fetch_add(1, Ordering::Relaxed)
                            );
                            // Only the hammering counts, not region setup.
                            let outcome =
                                run_contention(&name, backend, threads, INCREMENTS_PER_THREAD)
                                    .expect("contention run failed");
                            assert!(outcome.is_consistent());
                            total += outcome.duration;
                        }
                        total
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_contention);
criterion_main!(benches);
