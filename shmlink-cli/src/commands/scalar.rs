// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink put-scalar` / `get-scalar` commands.

use shmlink_core::{BackendKind, Region};

use super::options;

pub async fn put(
    name: &str,
    value: f64,
    backend: BackendKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let region = Region::attach_with(name, options(backend))?;
    region.put_scalar(value)?;
    tracing::debug!(region = %name, value = value, "Scalar written");
    println!("{}", value);
    Ok(())
}

pub async fn get(name: &str, backend: BackendKind) -> Result<(), Box<dyn std::error::Error>> {
    let region = Region::attach_with(name, options(backend))?;
    println!("{}", region.get_scalar()?);
    Ok(())
}
