// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for shmlink.
//!
//! All errors are explicit enum variants. No `Box<dyn Error>`, no
//! `anyhow::Result` in the library.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Top-level error type for shmlink.
#[derive(Debug, Error)]
pub enum ShmLinkError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Region Errors
    // =========================================================================
    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors reject a configuration before any region exists.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Payload size out of bounds: {bytes} bytes (max: {max})")]
    PayloadOutOfBounds { bytes: usize, max: usize },

    #[error("Duplicate region name: {name}")]
    DuplicateRegionName { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Handle lifecycle errors.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Cannot transition from {from} to {to} for region {name}")]
    InvalidTransition {
        name: String,
        from: &'static str,
        to: &'static str,
    },
}

/// Errors raised by a region handle or its backing OS objects.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("Invalid region name '{name}': {reason}")]
    Name { name: String, reason: String },

    #[error("Failed to allocate region {name}: {reason}")]
    Allocation { name: String, reason: String },

    #[error("Failed to map region {name}: {reason}")]
    Map { name: String, reason: String },

    #[error("Region {name} not found: {reason}")]
    NotFound { name: String, reason: String },

    #[error("Semaphore {operation} failed for region {name}: {source}")]
    Semaphore {
        name: String,
        operation: &'static str,
        #[source]
        source: Errno,
    },

    #[error("Region {name} has no usable object (handle is closed)")]
    NoObject { name: String },

    #[error("Teardown of region {name} failed: {reason}")]
    Teardown { name: String, reason: String },

    #[error("Payload size mismatch for region {name}: expected {expected} bytes, got {actual}")]
    PayloadSize {
        name: String,
        expected: usize,
        actual: usize,
    },
}

impl RegionError {
    /// Flat error code for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Name { .. } => ErrorKind::Name,
            Self::Allocation { .. } => ErrorKind::Allocation,
            Self::Map { .. } => ErrorKind::Map,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Semaphore { .. } => ErrorKind::Semaphore,
            Self::NoObject { .. } => ErrorKind::NoObject,
            Self::Teardown { .. } => ErrorKind::Teardown,
            Self::PayloadSize { .. } => ErrorKind::PayloadSize,
        }
    }
}

/// Flat error code, comparable and copyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Name,
    Allocation,
    Map,
    NotFound,
    Semaphore,
    NoObject,
    Teardown,
    PayloadSize,
}

impl ErrorKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Name => "NameError",
            Self::Allocation => "AllocationError",
            Self::Map => "MapError",
            Self::NotFound => "NotFoundError",
            Self::Semaphore => "SemaphoreError",
            Self::NoObject => "NoObjectError",
            Self::Teardown => "TeardownError",
            Self::PayloadSize => "PayloadSizeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Last failure recorded by a region handle: the error code and the call
/// site that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub location: &'static Location<'static>,
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.kind,
            self.location.file(),
            self.location.line()
        )
    }
}

/// Result type alias for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Result type alias using ShmLinkError.
pub type ShmLinkResult<T> = Result<T, ShmLinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_error_display() {
        let err = RegionError::PayloadSize {
            name: "telemetry".to_string(),
            expected: 16,
            actual: 4,
        };
        assert!(err.to_string().contains("telemetry"));
        assert!(err.to_string().contains("16"));
        assert_eq!(err.kind(), ErrorKind::PayloadSize);
    }

    #[test]
    fn test_error_chain() {
        let region_err = RegionError::NoObject {
            name: "gone".to_string(),
        };
        let top: ShmLinkError = region_err.into();
        assert!(matches!(top, ShmLinkError::Region(_)));
    }

    #[test]
    fn test_semaphore_error_keeps_errno() {
        let err = RegionError::Semaphore {
            name: "r".to_string(),
            operation: "wait",
            source: Errno::EINTR,
        };
        assert_eq!(err.kind(), ErrorKind::Semaphore);
        let source = std::error::Error::source(&err).expect("errno source");
        assert!(source.to_string().contains("Interrupted"));
    }

    #[test]
    fn test_error_record_display() {
        let record = ErrorRecord {
            kind: ErrorKind::NotFound,
            location: Location::caller(),
        };
        let text = record.to_string();
        assert!(text.starts_with("NotFoundError at "));
        assert!(text.contains("error.rs"));
    }
}
