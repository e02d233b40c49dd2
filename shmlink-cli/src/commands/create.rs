// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink create` command - Create one region.
//!
//! Without `--hold` the region is created and torn down again, which
//! checks that the name and size are usable on this host.

use shmlink_core::{BackendKind, Region};
use tokio::signal::unix::{signal, SignalKind};

use super::options;

pub async fn execute(
    name: &str,
    payload: usize,
    hold: bool,
    backend: BackendKind,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(region = %name, payload = payload, backend = %backend, "Creating region");

    // Installed before the region is announced.
    let mut interrupt = if hold {
        Some(signal(SignalKind::interrupt())?)
    } else {
        None
    };

    let region = Region::create_with(name, payload, options(backend))?;
    println!(
        "✓ Created '{}' ({} backend, payload {} bytes, total {} bytes)",
        region.name(),
        region.backend(),
        region.payload_len(),
        region.total_len()
    );

    if let Some(interrupt) = interrupt.as_mut() {
        println!("Holding region. Press Ctrl+C to release...");
        interrupt.recv().await;
        println!();
        println!("Shutting down...");
    }

    region.close()?;
    println!("✓ Released '{}'", name);
    Ok(())
}
