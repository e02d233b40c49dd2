// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink put-payload` / `get-payload` commands. Payloads travel as hex.

use shmlink_core::{BackendKind, Region, Transfer};

use super::{options, CliError};

pub async fn put(
    name: &str,
    hex_bytes: &str,
    backend: BackendKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = hex::decode(hex_bytes.trim()).map_err(CliError::from)?;
    let region = Region::attach_with(name, options(backend))?;

    if bytes.len() != region.payload_len() {
        return Err(CliError::PayloadLength {
            name: name.to_string(),
            expected: region.payload_len(),
            actual: bytes.len(),
        }
        .into());
    }

    match region.put_payload(&bytes)? {
        Transfer::Copied(n) => println!("Wrote {} bytes to '{}'", n, name),
        Transfer::Skipped => println!("'{}' has no payload; nothing written", name),
    }
    Ok(())
}

pub async fn get(name: &str, backend: BackendKind) -> Result<(), Box<dyn std::error::Error>> {
    let region = Region::attach_with(name, options(backend))?;
    let bytes = region.read_payload()?;
    println!("{}", hex::encode(bytes));
    Ok(())
}
