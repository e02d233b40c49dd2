// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Describes which regions a host process creates and how they are torn
//! down. Any invalid field results in a HardValidationError.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HardValidationError, ShmLinkError, ShmLinkResult};
use crate::types::{BackendKind, RegionName};

/// Largest payload a configured region may declare (64 MiB).
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Upper bound on the teardown lock wait.
const MAX_TEARDOWN_TIMEOUT_MS: u64 = 60_000;

/// Raw region entry as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawRegionConfig {
    name: String,
    #[serde(default)]
    payload_bytes: usize,
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    backend: BackendKind,
    #[serde(default = "default_teardown_timeout_ms")]
    teardown_timeout_ms: u64,
    regions: Option<Vec<RawRegionConfig>>,
}

fn default_teardown_timeout_ms() -> u64 {
    1000
}

/// Validated region entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionConfig {
    pub name: RegionName,
    pub payload_bytes: usize,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub teardown_timeout: Duration,
    pub regions: Vec<RegionConfig>,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> ShmLinkResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ShmLinkError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ShmLinkError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> ShmLinkResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ShmLinkError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> ShmLinkResult<Config> {
        if raw.teardown_timeout_ms == 0 || raw.teardown_timeout_ms > MAX_TEARDOWN_TIMEOUT_MS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "teardown_timeout_ms",
                value: raw.teardown_timeout_ms.to_string(),
                reason: format!("Must be between 1 and {}", MAX_TEARDOWN_TIMEOUT_MS),
            }
            .into());
        }

        let raw_regions = raw
            .regions
            .ok_or_else(|| HardValidationError::MissingRequiredField {
                field: "regions",
                context: "root".to_string(),
            })?;

        let mut regions = Vec::with_capacity(raw_regions.len());
        let mut seen_names = std::collections::HashSet::new();

        for (index, raw_region) in raw_regions.into_iter().enumerate() {
            let region = Self::validate_region(raw_region, index)?;

            if !seen_names.insert(region.name.clone()) {
                return Err(HardValidationError::DuplicateRegionName {
                    name: region.name.to_string(),
                }
                .into());
            }

            regions.push(region);
        }

        if regions.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one region must be defined".to_string(),
            }
            .into());
        }

        Ok(Config {
            backend: raw.backend,
            teardown_timeout: Duration::from_millis(raw.teardown_timeout_ms),
            regions,
        })
    }

    fn validate_region(raw: RawRegionConfig, index: usize) -> ShmLinkResult<RegionConfig> {
        let name = RegionName::new(&raw.name).map_err(|e| {
            HardValidationError::InvalidFieldValue {
                field: "name",
                value: format!("{:?} (region at index {})", raw.name, index),
                reason: e.to_string(),
            }
        })?;

        if raw.payload_bytes > MAX_PAYLOAD_BYTES {
            return Err(HardValidationError::PayloadOutOfBounds {
                bytes: raw.payload_bytes,
                max: MAX_PAYLOAD_BYTES,
            }
            .into());
        }

        Ok(RegionConfig {
            name,
            payload_bytes: raw.payload_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
backend: sysv
teardown_timeout_ms: 250

regions:
  - name: telemetry
    payload_bytes: 16
  - name: heartbeat
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.backend, BackendKind::Sysv);
        assert_eq!(config.teardown_timeout, Duration::from_millis(250));
        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.regions[0].name.as_str(), "telemetry");
        assert_eq!(config.regions[0].payload_bytes, 16);
        assert_eq!(config.regions[1].payload_bytes, 0);
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
regions:
  - name: only
    payload_bytes: 8
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.backend, BackendKind::Posix);
        assert_eq!(config.teardown_timeout, Duration::from_millis(1000));
    }

    #[test]
    fn test_missing_regions() {
        let yaml = "backend: posix\nregions: []\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(ShmLinkError::HardValidation(
                HardValidationError::SchemaValidation { .. }
            ))
        ));

        assert!(matches!(
            ConfigLoader::load_string("backend: posix\n"),
            Err(ShmLinkError::HardValidation(
                HardValidationError::MissingRequiredField { field: "regions", .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_region_name() {
        let yaml = r#"
regions:
  - name: ""
"#;
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(
            err,
            ShmLinkError::HardValidation(HardValidationError::InvalidFieldValue { field: "name", .. })
        ));
    }

    #[test]
    fn test_duplicate_names() {
        let yaml = r#"
regions:
  - name: dup
    payload_bytes: 4
  - name: dup
    payload_bytes: 8
"#;
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(
            err,
            ShmLinkError::HardValidation(HardValidationError::DuplicateRegionName { .. })
        ));
    }

    #[test]
    fn test_payload_too_large() {
        let yaml = format!(
            "regions:\n  - name: big\n    payload_bytes: {}\n",
            MAX_PAYLOAD_BYTES + 1
        );
        assert!(ConfigLoader::load_string(&yaml).is_err());
    }

    #[test]
    fn test_teardown_timeout_bounds() {
        let zero = "teardown_timeout_ms: 0\nregions:\n  - name: r\n";
        assert!(ConfigLoader::load_string(zero).is_err());

        let huge = "teardown_timeout_ms: 600000\nregions:\n  - name: r\n";
        assert!(ConfigLoader::load_string(huge).is_err());
    }

    #[test]
    fn test_unknown_backend() {
        let yaml = "backend: mach\nregions:\n  - name: r\n";
        let err = ConfigLoader::load_string(yaml).unwrap_err();
        assert!(matches!(err, ShmLinkError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_file("/nonexistent/shmlink.yaml").unwrap_err();
        assert!(matches!(err, ShmLinkError::ConfigNotFound { .. }));
    }
}
