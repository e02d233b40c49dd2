// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink lam` command - Read or set the look-at-me flag.

use shmlink_core::{BackendKind, Region};

use super::options;

pub async fn execute(
    name: &str,
    set: Option<bool>,
    backend: BackendKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let region = Region::attach_with(name, options(backend))?;
    if let Some(value) = set {
        region.set_lam(value)?;
    }
    println!("{}", region.get_lam()?);
    Ok(())
}
