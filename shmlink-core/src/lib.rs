// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! shmlink Core Library
//!
//! Named, cross-process shared-memory regions. Each region is a fixed
//! header followed by an optional payload, guarded by one named semaphore.
//! POSIX and System V primitives sit behind the same handle API.

pub mod config;
pub mod error;
pub mod log;
pub mod shm;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigLoader, RegionConfig};
pub use error::{
    ErrorKind, ErrorRecord, HardValidationError, RegionError, RegionResult, ShmLinkError,
    ShmLinkResult,
};
pub use log::{LogSink, NoopSink, TracingSink};
pub use shm::{
    cleanup, fingerprint, CleanupReport, HeaderSnapshot, ObjectNames, Region, RegionGuard, RegionOptions,
    Role, Transfer, HEADER_SIZE,
};
pub use state::HandleState;
pub use types::{BackendKind, RegionName, Timestamp};
