// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Metrics types for benchmark results.
//!
//! Latency distributions, throughput, and the host description attached to
//! every report.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Categories of benchmarks supported by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkCategory {
    /// Scalar, LAM and timestamp operations
    Header,
    /// Payload copies in and out
    Payload,
    /// Many handles fighting over one lock
    Contention,
    /// Create, attach and teardown
    Lifecycle,
}

impl BenchmarkCategory {
    pub const ALL: [BenchmarkCategory; 4] = [
        BenchmarkCategory::Header,
        BenchmarkCategory::Payload,
        BenchmarkCategory::Contention,
        BenchmarkCategory::Lifecycle,
    ];
}

impl std::fmt::Display for BenchmarkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkCategory::Header => write!(f, "header"),
            BenchmarkCategory::Payload => write!(f, "payload"),
            BenchmarkCategory::Contention => write!(f, "contention"),
            BenchmarkCategory::Lifecycle => write!(f, "lifecycle"),
        }
    }
}

/// Latency distribution in nanoseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    pub min_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
    /// p50
    pub median_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub std_dev_ns: f64,
    /// Sorted raw samples, downsampled above 10k entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<u64>>,
}

impl LatencyMetrics {
    /// Summarize latency samples (in nanoseconds).
    pub fn from_samples(mut samples: Vec<u64>, keep_raw: bool) -> Self {
        if samples.is_empty() {
            return Self {
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
                std_dev_ns: 0.0,
                samples: None,
            };
        }

        samples.sort_unstable();
        let len = samples.len();
        let percentile = |p: f64| samples[((len as f64 * p) as usize).min(len - 1)];

        let mean_ns = samples.iter().map(|&x| x as f64).sum::<f64>() / len as f64;
        let variance = samples
            .iter()
            .map(|&x| {
                let diff = x as f64 - mean_ns;
                diff * diff
            })
            .sum::<f64>()
            / len as f64;

        let min_ns = samples[0];
        let max_ns = samples[len - 1];
        let median_ns = percentile(0.5);
        let p95_ns = percentile(0.95);
        let p99_ns = percentile(0.99);

        let raw_samples = match keep_raw {
            false => None,
            true if len > 10_000 => Some(samples.iter().step_by(len / 1000).copied().collect()),
            true => Some(samples),
        };

        Self {
            min_ns,
            max_ns,
            mean_ns,
            median_ns,
            p95_ns,
            p99_ns,
            std_dev_ns: variance.sqrt(),
            samples: raw_samples,
        }
    }

    /// Human-readable latency (ns/μs/ms/s).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / 1_000_000_000.0)
        }
    }
}

/// Operations per second over a timed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThroughputMetrics {
    pub ops_per_sec: f64,
    pub total_ops: u64,
    pub duration_ns: u64,
}

impl ThroughputMetrics {
    pub fn calculate(ops: u64, duration_ns: u64) -> Self {
        let duration_secs = duration_ns.max(1) as f64 / 1_000_000_000.0;
        Self {
            ops_per_sec: ops as f64 / duration_secs,
            total_ops: ops,
            duration_ns,
        }
    }
}

/// Host the benchmarks ran on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub kernel_version: Option<String>,
    pub cpu_model: String,
    pub cpu_cores: usize,
    pub memory_bytes: u64,
    /// Whether `/dev/shm` is mounted, where POSIX objects live on Linux.
    pub dev_shm: bool,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();
        sys.refresh_memory();

        Self {
            os: System::long_os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            dev_shm: std::path::Path::new("/dev/shm").is_dir(),
        }
    }
}

/// A single benchmark result with all associated metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub category: BenchmarkCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<ThroughputMetrics>,
    pub iterations: u64,
    /// Backend, payload size, thread count and similar parameters.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    pub fn latency(
        name: impl Into<String>,
        category: BenchmarkCategory,
        samples: Vec<u64>,
        keep_raw_samples: bool,
    ) -> Self {
        let iterations = samples.len() as u64;
        Self {
            name: name.into(),
            category,
            latency: Some(LatencyMetrics::from_samples(samples, keep_raw_samples)),
            throughput: None,
            iterations,
            metadata: HashMap::new(),
        }
    }

    /// Attach throughput figures to a result.
    pub fn with_throughput(mut self, ops: u64, duration_ns: u64) -> Self {
        self.throughput = Some(ThroughputMetrics::calculate(ops, duration_ns));
        self
    }

    /// Add a metadata entry. Values that fail to serialize are stored as null.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.metadata.insert(
            key.into(),
            serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
        );
        self
    }
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub benchmark_suite: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self {
            benchmark_suite: "shmlink-benchmarks".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            results: Vec::new(),
        }
    }

    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_metrics_from_samples() {
        let samples = vec![100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
        let metrics = LatencyMetrics::from_samples(samples, false);

        assert_eq!(metrics.min_ns, 100);
        assert_eq!(metrics.max_ns, 1000);
        assert_eq!(metrics.median_ns, 600);
        assert_eq!(metrics.p99_ns, 1000);
        assert!((metrics.mean_ns - 550.0).abs() < 0.01);
        assert!(metrics.samples.is_none());
    }

    #[test]
    fn test_single_sample() {
        let metrics = LatencyMetrics::from_samples(vec![42], true);
        assert_eq!(metrics.p95_ns, 42);
        assert_eq!(metrics.std_dev_ns, 0.0);
        assert_eq!(metrics.samples, Some(vec![42]));
    }

    #[test]
    fn test_latency_format() {
        assert_eq!(LatencyMetrics::format_latency(500), "500ns");
        assert_eq!(LatencyMetrics::format_latency(1500), "1.50μs");
        assert_eq!(LatencyMetrics::format_latency(1_500_000), "1.50ms");
        assert_eq!(LatencyMetrics::format_latency(1_500_000_000), "1.50s");
    }

    #[test]
    fn test_throughput_calculation() {
        let metrics = ThroughputMetrics::calculate(80_000, 2_000_000_000);
        assert!((metrics.ops_per_sec - 40_000.0).abs() < 0.01);
    }

    #[test]
    fn test_benchmark_result_serialization() {
        let result = BenchmarkResult::latency(
            "put_scalar",
            BenchmarkCategory::Header,
            vec![100, 200, 300],
            false,
        )
        .with_metadata("backend", "sysv");

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("put_scalar"));
        assert!(json.contains("\"header\""));
        assert!(json.contains("sysv"));
    }
}
