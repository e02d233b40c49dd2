// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::sync::Arc;

use shmlink_core::{BackendKind, RegionOptions, TracingSink};

pub mod cleanup;
pub mod create;
pub mod inspect;
pub mod lam;
pub mod monitor;
pub mod payload;
pub mod scalar;
pub mod up;
pub mod validate;

/// Input errors detected by the CLI before touching a region.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Invalid hex payload: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Payload for '{name}' must be {expected} bytes, got {actual}")]
    PayloadLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Region options for one-shot commands: the chosen backend, with region
/// diagnostics routed into the tracing subscriber.
pub(crate) fn options(backend: BackendKind) -> RegionOptions {
    RegionOptions::new()
        .backend(backend)
        .sink(Arc::new(TracingSink))
}
