// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Mutual exclusion under contention.
//!
//! Each thread attaches its own handle and performs unprotected
//! read-modify-write cycles on a counter in the payload while holding the
//! region lock. Any lost update shows up as a short final count.

use std::sync::{Arc, Barrier};
use std::thread;

use shmlink_core::{BackendKind, Region, RegionOptions};

const THREADS: usize = 8;
const INCREMENTS: u64 = 10_000;

fn hammer(backend: BackendKind) {
    let name = format!("it-stress-{}-{}", backend, std::process::id());
    let options = RegionOptions::new().backend(backend);
    let creator = Region::create_with(&name, 8, options.clone()).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let name = name.clone();
            let options = options.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let region = Region::attach_with(&name, options).unwrap();
                barrier.wait();
                for _ in 0..INCREMENTS {
                    let mut guard = region.lock().unwrap();
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(guard.payload());
                    let next = u64::from_ne_bytes(raw) + 1;
                    guard.payload_mut().copy_from_slice(&next.to_ne_bytes());
                    guard.unlock().unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    let bytes = creator.read_payload().unwrap();
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes);
    assert_eq!(u64::from_ne_bytes(raw), THREADS as u64 * INCREMENTS);
}

#[test]
fn test_posix_lock_serializes_writers() {
    hammer(BackendKind::Posix);
}

#[test]
fn test_sysv_lock_serializes_writers() {
    hammer(BackendKind::Sysv);
}

/// A scalar writer and a reader interleave without tearing the header.
#[test]
fn test_scalar_reads_are_whole() {
    let name = format!("it-scalar-{}", std::process::id());
    let creator = Region::create(&name, 0).unwrap();

    let writer = {
        let name = name.clone();
        thread::spawn(move || {
            let region = Region::attach(&name).unwrap();
            for i in 0..2_000 {
                region.put_scalar(f64::from(i)).unwrap();
            }
        })
    };

    let mut last = -1.0;
    for _ in 0..2_000 {
        let value = creator.get_scalar().unwrap();
        assert_eq!(value.fract(), 0.0);
        assert!(value >= last, "scalar went backwards: {} < {}", value, last);
        last = value;
    }
    writer.join().unwrap();
    assert_eq!(creator.get_scalar().unwrap(), 1_999.0);
}
