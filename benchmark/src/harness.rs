// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for timing region operations.
//!
//! Collects per-iteration latency samples, and drives multi-threaded lock
//! contention runs where every thread holds its own attached handle.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use shmlink_core::{BackendKind, Region, RegionOptions, RegionResult};

/// A benchmark harness for measuring operation latency.
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u64,
    /// Number of measurement iterations
    measurement_iterations: u64,
}

impl BenchmarkHarness {
    pub fn new() -> Self {
        Self {
            warmup_iterations: 10,
            measurement_iterations: 100,
        }
    }

    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    pub fn iterations(mut self, iterations: u64) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    /// Run `operation` repeatedly and return latency samples in nanoseconds.
    pub fn run<F>(&self, mut operation: F) -> Vec<u64>
    where
        F: FnMut(),
    {
        for _ in 0..self.warmup_iterations {
            operation();
        }

        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let start = Instant::now();
            operation();
            samples.push(start.elapsed().as_nanos() as u64);
        }
        samples
    }

    /// Like [`BenchmarkHarness::run`], but stops at the first failed
    /// iteration.
    pub fn try_run<F>(&self, mut operation: F) -> RegionResult<Vec<u64>>
    where
        F: FnMut() -> RegionResult<()>,
    {
        for _ in 0..self.warmup_iterations {
            operation()?;
        }

        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let start = Instant::now();
            operation()?;
            samples.push(start.elapsed().as_nanos() as u64);
        }
        Ok(samples)
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one contention run.
#[derive(Debug, Clone)]
pub struct ContentionOutcome {
    pub threads: usize,
    /// Lock/modify/unlock cycles across all threads.
    pub total_ops: u64,
    /// Counter value read back from the payload afterwards.
    pub final_count: u64,
    pub duration: Duration,
    /// Time each cycle spent waiting for and holding the lock.
    pub samples: Vec<u64>,
}

impl ContentionOutcome {
    /// True when no increment was lost.
    pub fn is_consistent(&self) -> bool {
        self.final_count == self.total_ops
    }
}

/// Hammer a fresh region from `threads` threads, each performing
/// `iterations` locked increments of a u64 counter stored in the payload.
pub fn run_contention(
    name: &str,
    backend: BackendKind,
    threads: usize,
    iterations: u64,
) -> RegionResult<ContentionOutcome> {
    let options = RegionOptions::new().backend(backend);
    let creator = Region::create_with(name, 8, options.clone())?;

    // Attach up front so handle setup is not part of the measurement.
    let handles = (0..threads)
        .map(|_| Region::attach_with(name, options.clone()))
        .collect::<RegionResult<Vec<_>>>()?;

    let barrier = Arc::new(Barrier::new(threads + 1));
    let workers: Vec<_> = handles
        .into_iter()
        .map(|region| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || -> RegionResult<Vec<u64>> {
                let mut samples = Vec::with_capacity(iterations as usize);
                barrier.wait();
                for _ in 0..iterations {
                    let start = Instant::now();
                    let mut guard = region.lock()?;
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(guard.payload());
                    let next = u64::from_ne_bytes(raw).wrapping_add(1);
                    guard.payload_mut().copy_from_slice(&next.to_ne_bytes());
                    guard.unlock()?;
                    samples.push(start.elapsed().as_nanos() as u64);
                }
                Ok(samples)
            })
        })
        .collect();

    barrier.wait();
    let start = Instant::now();
    let mut samples = Vec::with_capacity(threads * iterations as usize);
    let mut failure = None;
    for worker in workers {
        match worker.join() {
            Ok(Ok(thread_samples)) => samples.extend(thread_samples),
            Ok(Err(e)) => failure = Some(e),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
    let duration = start.elapsed();
    if let Some(e) = failure {
        return Err(e);
    }

    let bytes = creator.read_payload()?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes);
    creator.close()?;

    Ok(ContentionOutcome {
        threads,
        total_ops: threads as u64 * iterations,
        final_count: u64::from_ne_bytes(raw),
        duration,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_basic() {
        let harness = BenchmarkHarness::new().warmup(5).iterations(20);

        let samples = harness.run(|| {
            thread::sleep(Duration::from_micros(100));
        });

        assert_eq!(samples.len(), 20);
        for sample in &samples {
            assert!(*sample >= 100_000, "Sample {} < 100μs", sample);
        }
    }

    #[test]
    fn test_try_run_stops_on_error() {
        let region_name = format!("bench-missing-{}", std::process::id());
        let harness = BenchmarkHarness::new().warmup(0).iterations(5);
        let result = harness.try_run(|| Region::attach(&region_name).map(drop));
        assert!(result.is_err());
    }

    #[test]
    fn test_contention_is_consistent() {
        for backend in [BackendKind::Posix, BackendKind::Sysv] {
            let name = format!("bench-contention-{}-{}", backend, std::process::id());
            let outcome = run_contention(&name, backend, 4, 500).unwrap();
            assert!(outcome.is_consistent(), "{:?}", outcome.final_count);
            assert_eq!(outcome.samples.len(), 2000);
        }
    }
}
