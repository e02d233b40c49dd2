// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink cleanup` command - Remove objects left behind by a dead creator.

use shmlink_core::{cleanup, BackendKind, RegionName};

pub async fn execute(name: &str, backend: BackendKind) -> Result<(), Box<dyn std::error::Error>> {
    let name = RegionName::new(name)?;
    tracing::info!(region = %name, backend = %backend, "Cleaning up region objects");

    let report = cleanup(&name, backend)?;
    let mark = |removed: bool| if removed { "removed" } else { "absent" };

    println!("Cleanup of '{}' ({}):", name, backend);
    println!("  store:     {}", mark(report.store_removed));
    println!("  semaphore: {}", mark(report.semaphore_removed));
    Ok(())
}
