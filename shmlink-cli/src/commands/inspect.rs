// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `shmlink inspect` command - Dump a region's header and identifiers.

use serde::Serialize;
use shmlink_core::{fingerprint, BackendKind, HeaderSnapshot, Region, Timestamp, HEADER_SIZE};

use super::options;

/// Everything `inspect` reports, in the shape emitted by `--json`.
#[derive(Debug, Serialize)]
struct InspectReport {
    name: String,
    backend: BackendKind,
    fingerprint: String,
    header_size: usize,
    total_size: usize,
    payload_size: usize,
    header: HeaderSnapshot,
    age_seconds: Option<f64>,
    payload_crc32: u32,
    objects: Objects,
}

#[derive(Debug, Serialize)]
struct Objects {
    posix_store: String,
    posix_semaphore: String,
    sysv_store_key: String,
    sysv_semaphore_key: String,
}

pub async fn execute(
    name: &str,
    json: bool,
    backend: BackendKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let region = Region::attach_with(name, options(backend))?;

    // Header and payload come from separate lock holds; a writer may slip
    // in between, which is fine for a diagnostic dump.
    let header = region.snapshot()?;
    let payload = region.read_payload()?;
    let names = region.object_names();

    let report = InspectReport {
        name: region.name().to_string(),
        backend: region.backend(),
        fingerprint: fingerprint(region.name()),
        header_size: HEADER_SIZE,
        total_size: region.total_len(),
        payload_size: region.payload_len(),
        header,
        age_seconds: if header.last_update.is_unset() {
            None
        } else {
            Some(Timestamp::now().seconds_since(header.last_update))
        },
        payload_crc32: crc32fast::hash(&payload),
        objects: Objects {
            posix_store: names.posix_store.clone(),
            posix_semaphore: names.posix_semaphore.clone(),
            sysv_store_key: format!("{:#010x}", names.sysv_store_key),
            sysv_semaphore_key: format!("{:#010x}", names.sysv_semaphore_key),
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ Region: {:<53}║", report.name);
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("  Backend:        {}", report.backend);
    println!("  Fingerprint:    {}", report.fingerprint);
    println!(
        "  Size:           {} bytes ({} header + {} payload)",
        report.total_size, report.header_size, report.payload_size
    );
    println!();
    println!("  Last Update:    {}", report.header.last_update);
    match report.age_seconds {
        Some(age) => println!("  Age:            {:.6}s", age),
        None => println!("  Age:            never updated"),
    }
    println!("  Scalar:         {}", report.header.scalar);
    println!("  LAM:            {}", report.header.notify);
    println!("  Payload CRC32:  {:08x}", report.payload_crc32);
    println!();
    match backend {
        BackendKind::Posix => {
            println!("  Store:          /dev/shm{}", report.objects.posix_store);
            println!(
                "  Semaphore:      /dev/shm/sem.{}",
                report.objects.posix_semaphore.trim_start_matches('/')
            );
        }
        BackendKind::Sysv => {
            println!("  Store Key:      {}", report.objects.sysv_store_key);
            println!("  Semaphore Key:  {}", report.objects.sysv_semaphore_key);
        }
    }
    println!("╚══════════════════════════════════════════════════════════════╝");

    Ok(())
}
