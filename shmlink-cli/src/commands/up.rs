// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink up` command - Create every configured region.
//!
//! Regions live until Ctrl+C, then are torn down in reverse creation order.

use shmlink_core::{ConfigLoader, Region, RegionOptions};

use super::options;

pub async fn execute(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(config = %config_path, "Bringing regions up");

    // Fail fast on invalid config
    let config = ConfigLoader::load_file(config_path)?;
    let region_options: RegionOptions =
        options(config.backend).teardown_timeout(config.teardown_timeout);

    tracing::info!(
        regions = config.regions.len(),
        backend = %config.backend,
        "Configuration validated successfully"
    );

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                        SHMLINK UP                            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut regions: Vec<Region> = Vec::with_capacity(config.regions.len());
    for entry in &config.regions {
        println!("▶ Creating region: {}", entry.name);
        match Region::create_with(
            entry.name.as_str(),
            entry.payload_bytes,
            region_options.clone(),
        ) {
            Ok(region) => {
                println!(
                    "  ✓ {} ready ({} bytes payload)",
                    entry.name,
                    region.payload_len()
                );
                regions.push(region);
            }
            Err(e) => {
                println!("  ✗ {} failed: {}", entry.name, e);
                tracing::error!(region = %entry.name, error = %e, "Failed to create region");
                release_all(regions);
                return Err(e.into());
            }
        }
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!(
        "║ Status: {:<3} regions up ({:<5} backend)                       ║",
        regions.len(),
        config.backend.name()
    );
    println!("╠══════════════════════════════════════════════════════════════╣");
    for region in &regions {
        println!(
            "║ ● {:<24} {:>10} bytes  {}",
            region.name().as_str(),
            region.total_len(),
            shmlink_core::fingerprint(region.name())
        );
    }
    println!("╚══════════════════════════════════════════════════════════════╝");

    println!();
    println!("Press Ctrl+C to stop...");
    println!();

    tokio::signal::ctrl_c().await?;

    println!();
    println!("Shutting down...");
    tracing::info!("Tearing down regions");
    release_all(regions);

    println!();
    println!("All regions released.");
    Ok(())
}

fn release_all(mut regions: Vec<Region>) {
    while let Some(region) = regions.pop() {
        let name = region.name().to_string();
        print!("  Releasing {}... ", name);
        match region.close() {
            Ok(()) => println!("done"),
            Err(e) => {
                println!("failed");
                tracing::warn!(region = %name, error = %e, "Teardown reported errors");
            }
        }
    }
}
