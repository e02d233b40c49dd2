// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::RegionError;

/// Maximum length of a logical region name in bytes.
///
/// Leaves room under NAME_MAX for the semaphore prefix.
pub const MAX_NAME_LEN: usize = 200;

/// Validated logical region name.
/// Non-empty ASCII alphanumerics plus `-`, `_` and `.`, no leading dot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionName(String);

impl RegionName {
    /// Create a new RegionName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, RegionError> {
        let name = name.into();

        if name.is_empty() {
            return Err(RegionError::Name {
                name,
                reason: "Region name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_NAME_LEN {
            return Err(RegionError::Name {
                reason: format!(
                    "Region name too long: {} bytes (max {})",
                    name.len(),
                    MAX_NAME_LEN
                ),
                name,
            });
        }

        if name.starts_with('.') {
            return Err(RegionError::Name {
                name,
                reason: "Region name cannot start with '.'".to_string(),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(RegionError::Name {
                name,
                reason: "Region name must contain only ASCII alphanumerics, '-', '_' and '.'"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RegionName {
    type Error = RegionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RegionName {
    type Error = RegionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RegionName> for String {
    fn from(name: RegionName) -> Self {
        name.0
    }
}

/// OS primitive family backing a region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `shm_open` + `mmap` + `sem_open`.
    #[default]
    Posix,
    /// `shmget` + `shmat` + `semget`.
    Sysv,
}

impl BackendKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Sysv => "sysv",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "posix" => Ok(Self::Posix),
            "sysv" | "systemv" | "system-v" => Ok(Self::Sysv),
            other => Err(format!("unknown backend '{}' (expected posix or sysv)", other)),
        }
    }
}

/// Wall-clock timestamp as stored in the region header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    pub secs: i64,
    pub nanos: i64,
}

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => Self {
                secs: d.as_secs() as i64,
                nanos: i64::from(d.subsec_nanos()),
            },
            // Clock set before 1970
            Err(e) => {
                let d = e.duration();
                Self {
                    secs: -(d.as_secs() as i64),
                    nanos: -i64::from(d.subsec_nanos()),
                }
            }
        }
    }

    /// Seconds since the Unix epoch as a float.
    pub fn as_secs_f64(&self) -> f64 {
        self.secs as f64 + self.nanos as f64 * 1e-9
    }

    /// `self - earlier` in seconds.
    pub fn seconds_since(&self, earlier: Timestamp) -> f64 {
        (self.secs - earlier.secs) as f64 + (self.nanos - earlier.nanos) as f64 * 1e-9
    }

    /// True for the all-zero value written at region creation.
    pub fn is_unset(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.secs, self.nanos.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_region_names() {
        assert!(RegionName::new("telemetry").is_ok());
        assert!(RegionName::new("cmd_notify-1").is_ok());
        assert!(RegionName::new("a.b").is_ok());
        assert!(RegionName::new("x".repeat(MAX_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_invalid_region_names() {
        assert!(RegionName::new("").is_err());
        assert!(RegionName::new("has/slash").is_err());
        assert!(RegionName::new("has space").is_err());
        assert!(RegionName::new(".hidden").is_err());
        assert!(RegionName::new("ünïcode").is_err());
        assert!(RegionName::new("x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_empty_name_is_name_error() {
        let err = RegionName::new("").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Name);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("posix".parse::<BackendKind>().unwrap(), BackendKind::Posix);
        assert_eq!("SysV".parse::<BackendKind>().unwrap(), BackendKind::Sysv);
        assert!("mach".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::default(), BackendKind::Posix);
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let a = Timestamp {
            secs: 10,
            nanos: 900_000_000,
        };
        let b = Timestamp {
            secs: 12,
            nanos: 100_000_000,
        };
        assert!((b.seconds_since(a) - 1.2).abs() < 1e-9);
        assert!((a.seconds_since(b) + 1.2).abs() < 1e-9);
        assert!(Timestamp::default().is_unset());
        assert!(!Timestamp::now().is_unset());
    }

    #[test]
    fn test_timestamp_display() {
        let t = Timestamp {
            secs: 5,
            nanos: 42,
        };
        assert_eq!(t.to_string(), "5.000000042");
    }
}
