// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Shared memory regions.
//!
//! A region is a fixed header plus an optional payload in one named
//! shared-memory object, guarded by one named semaphore. POSIX and
//! System V primitives implement the same contract.

mod backend;
mod guard;
mod header;
mod naming;
mod posix;
mod region;
mod sysv;

pub use backend::{cleanup, CleanupReport};
pub use guard::RegionGuard;
pub use header::{HeaderSnapshot, HEADER_SIZE};
pub use naming::{fingerprint, ObjectNames, SEMAPHORE_PREFIX};
pub use region::{Region, RegionOptions, Role, Transfer, DEFAULT_TEARDOWN_TIMEOUT};
