// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink validate` command - Validate configuration file.

use shmlink_core::{ConfigLoader, HEADER_SIZE};

pub async fn execute(file: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Settings:");
            println!("  Backend:          {}", config.backend);
            println!(
                "  Teardown Timeout: {}ms",
                config.teardown_timeout.as_millis()
            );
            println!();
            println!("Regions ({}):", config.regions.len());
            for region in &config.regions {
                println!(
                    "  - {} (payload: {} bytes, total: {} bytes)",
                    region.name,
                    region.payload_bytes,
                    HEADER_SIZE + region.payload_bytes
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
