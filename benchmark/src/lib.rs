// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! shmlink Benchmarking Framework
//!
//! Measures region operations on both backends and writes JSON reports.
//!
//! # Benchmark Categories
//!
//! - **Header**: scalar put/get, LAM, timestamp operations
//! - **Payload**: put/get at various payload sizes
//! - **Contention**: locked increments from several threads, one handle each
//! - **Lifecycle**: create + attach + teardown of a region

pub mod harness;
pub mod metrics;
pub mod reporter;

pub use harness::{run_contention, BenchmarkHarness, ContentionOutcome};
pub use metrics::{
    BenchmarkCategory, BenchmarkReport, BenchmarkResult, LatencyMetrics, SystemInfo,
    ThroughputMetrics,
};
pub use reporter::{JsonReporter, ReporterError};
