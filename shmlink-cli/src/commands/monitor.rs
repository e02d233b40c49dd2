// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink monitor` command - Live TUI view of one region.

use shmlink_core::{BackendKind, Region, RegionOptions};

use crate::tui;

pub async fn execute(name: &str, backend: BackendKind) -> Result<(), Box<dyn std::error::Error>> {
    // Default no-op sink: diagnostics would scribble over the alternate screen.
    let region = Region::attach_with(name, RegionOptions::new().backend(backend))?;
    tui::run_monitor(region).await
}
