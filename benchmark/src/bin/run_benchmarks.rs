// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the benchmark suite and write a JSON report.

use std::path::PathBuf;

use clap::Parser;
use shmlink_benchmark::{
    run_contention, BenchmarkCategory, BenchmarkHarness, BenchmarkReport, BenchmarkResult,
    JsonReporter, LatencyMetrics,
};
use shmlink_core::{BackendKind, Region, RegionOptions};

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Run shmlink benchmarks and generate JSON reports")]
struct Args {
    /// Output directory for benchmark data
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Number of iterations for each benchmark
    #[arg(short, long, default_value_t = 10_000)]
    iterations: u64,

    /// Categories to run (all if not specified)
    #[arg(short, long)]
    category: Option<Vec<String>>,

    /// Backends to measure
    #[arg(short, long, value_delimiter = ',', default_values_t = [BackendKind::Posix, BackendKind::Sysv])]
    backend: Vec<BackendKind>,

    /// Run in quick mode (fewer iterations)
    #[arg(long)]
    quick: bool,
}

const PAYLOAD_SIZES: [usize; 5] = [16, 256, 4096, 65536, 1 << 20];

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let iterations = if args.quick { 500 } else { args.iterations };

    println!("shmlink Benchmark Suite");
    println!("=======================");
    println!("Output directory: {:?}", args.output);
    println!("Iterations: {}", iterations);
    println!();

    let reporter = JsonReporter::new(&args.output)?;
    let mut report = BenchmarkReport::new();

    let wanted: Vec<BenchmarkCategory> = match &args.category {
        None => BenchmarkCategory::ALL.to_vec(),
        Some(names) => BenchmarkCategory::ALL
            .into_iter()
            .filter(|cat| names.iter().any(|n| n.eq_ignore_ascii_case(&cat.to_string())))
            .collect(),
    };

    for &backend in &args.backend {
        for &category in &wanted {
            println!("Running {} benchmarks ({})...", category, backend);
            match category {
                BenchmarkCategory::Header => run_header(&mut report, backend, iterations)?,
                BenchmarkCategory::Payload => run_payload(&mut report, backend, iterations)?,
                BenchmarkCategory::Contention => {
                    run_contention_suite(&mut report, backend, iterations)?
                }
                BenchmarkCategory::Lifecycle => run_lifecycle(&mut report, backend, iterations)?,
            }
        }
    }

    let path = reporter.save(&report)?;
    println!();
    println!("Benchmark report saved to: {:?}", path);
    println!();

    print_summary(&report);
    Ok(())
}

fn region_name(tag: &str, backend: BackendKind) -> String {
    format!("bench-{}-{}-{}", tag, backend, std::process::id())
}

fn run_header(
    report: &mut BenchmarkReport,
    backend: BackendKind,
    iterations: u64,
) -> anyhow::Result<()> {
    let harness = BenchmarkHarness::new()
        .warmup(iterations / 10)
        .iterations(iterations);
    let options = RegionOptions::new().backend(backend);
    let creator = Region::create_with(&region_name("header", backend), 0, options.clone())?;
    let peer = Region::attach_with(creator.name().as_str(), options)?;

    let mut value = 0.0;
    let cases: [(&str, Vec<u64>); 4] = [
        (
            "put_scalar",
            harness.try_run(|| {
                value += 1.0;
                creator.put_scalar(value)
            })?,
        ),
        ("get_scalar", harness.try_run(|| peer.get_scalar().map(drop))?),
        ("update_time", harness.try_run(|| creator.update_time())?),
        ("delta_check", harness.try_run(|| peer.delta_check().map(drop))?),
    ];

    for (name, samples) in cases {
        report.add_result(
            BenchmarkResult::latency(name, BenchmarkCategory::Header, samples, false)
                .with_metadata("backend", backend),
        );
        println!("  ✓ {}", name);
    }

    creator.close()?;
    Ok(())
}

fn run_payload(
    report: &mut BenchmarkReport,
    backend: BackendKind,
    iterations: u64,
) -> anyhow::Result<()> {
    let options = RegionOptions::new().backend(backend);

    for size in PAYLOAD_SIZES {
        // Large copies are slow; scale the sample count down.
        let count = (iterations * 4096 / size.max(4096) as u64).max(10);
        let harness = BenchmarkHarness::new().warmup(count / 10).iterations(count);

        let creator = Region::create_with(
            &region_name(&format!("payload{}", size), backend),
            size,
            options.clone(),
        )?;
        let peer = Region::attach_with(creator.name().as_str(), options.clone())?;
        let src = vec![0xABu8; size];
        let mut dst = vec![0u8; size];

        let put = harness.try_run(|| creator.put_payload(&src).map(drop))?;
        let get = harness.try_run(|| peer.get_payload(&mut dst).map(drop))?;

        for (op, samples) in [("put_payload", put), ("get_payload", get)] {
            let total: u64 = samples.iter().sum();
            let ops = samples.len() as u64;
            report.add_result(
                BenchmarkResult::latency(
                    format!("{}_{}", op, size),
                    BenchmarkCategory::Payload,
                    samples,
                    false,
                )
                .with_throughput(ops, total)
                .with_metadata("backend", backend)
                .with_metadata("payload_size_bytes", size),
            );
            println!("  ✓ {}_{}", op, size);
        }

        creator.close()?;
    }
    Ok(())
}

fn run_contention_suite(
    report: &mut BenchmarkReport,
    backend: BackendKind,
    iterations: u64,
) -> anyhow::Result<()> {
    for threads in [1usize, 2, 4, 8] {
        let name = region_name(&format!("contention{}", threads), backend);
        let outcome = run_contention(&name, backend, threads, iterations)?;
        anyhow::ensure!(
            outcome.is_consistent(),
            "lost updates with {} threads: {} of {}",
            threads,
            outcome.final_count,
            outcome.total_ops
        );

        report.add_result(
            BenchmarkResult::latency(
                format!("locked_increment_{}t", threads),
                BenchmarkCategory::Contention,
                outcome.samples,
                false,
            )
            .with_throughput(outcome.total_ops, outcome.duration.as_nanos() as u64)
            .with_metadata("backend", backend)
            .with_metadata("threads", threads),
        );
        println!("  ✓ locked_increment_{}t", threads);
    }
    Ok(())
}

fn run_lifecycle(
    report: &mut BenchmarkReport,
    backend: BackendKind,
    iterations: u64,
) -> anyhow::Result<()> {
    // Each iteration makes several syscalls and touches the filesystem.
    let harness = BenchmarkHarness::new()
        .warmup(5)
        .iterations((iterations / 20).max(10));
    let options = RegionOptions::new().backend(backend);
    let name = region_name("lifecycle", backend);

    let samples = harness.try_run(|| {
        let creator = Region::create_with(&name, 4096, options.clone())?;
        let attacher = Region::attach_with(&name, options.clone())?;
        attacher.close()?;
        creator.close()
    })?;

    report.add_result(
        BenchmarkResult::latency(
            "create_attach_close_4096",
            BenchmarkCategory::Lifecycle,
            samples,
            false,
        )
        .with_metadata("backend", backend),
    );
    println!("  ✓ create_attach_close_4096");
    Ok(())
}

fn print_summary(report: &BenchmarkReport) {
    println!("Summary");
    println!("-------");
    println!();

    for result in &report.results {
        if let Some(latency) = &result.latency {
            let backend = result
                .metadata
                .get("backend")
                .and_then(|v| v.as_str())
                .unwrap_or("-");
            println!(
                "{:<28} {:<6} median={:<10} p99={:<10}",
                result.name,
                backend,
                LatencyMetrics::format_latency(latency.median_ns),
                LatencyMetrics::format_latency(latency.p99_ns)
            );
        }
    }
}
