// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Logical name → OS identifiers.
//!
//! Every process that uses the same `RegionName` resolves the same store
//! and semaphore identifiers. The semaphore always carries a prefix so the
//! two namespaces never collide.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::RegionName;

/// Prefix applied to POSIX semaphore names.
pub const SEMAPHORE_PREFIX: &str = "shmlink.lock.";

/// Discriminator mixed into the System V memory key.
const STORE_DISCRIMINATOR: u8 = b'M';

/// Discriminator mixed into the System V semaphore key.
const SEMAPHORE_DISCRIMINATOR: u8 = b'S';

/// OS-visible identifiers derived from one logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectNames {
    /// POSIX shared-memory object path, `/<name>`.
    pub posix_store: String,
    /// POSIX named semaphore path, `/shmlink.lock.<name>`.
    pub posix_semaphore: String,
    /// System V shared-memory key.
    pub sysv_store_key: libc::key_t,
    /// System V semaphore-set key.
    pub sysv_semaphore_key: libc::key_t,
}

impl ObjectNames {
    pub fn derive(name: &RegionName) -> Self {
        Self {
            posix_store: format!("/{}", name),
            posix_semaphore: format!("/{}{}", SEMAPHORE_PREFIX, name),
            sysv_store_key: sysv_key(name, STORE_DISCRIMINATOR),
            sysv_semaphore_key: sysv_key(name, SEMAPHORE_DISCRIMINATOR),
        }
    }
}

impl fmt::Display for ObjectNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "store={} semaphore={} sysv_store_key={:#010x} sysv_semaphore_key={:#010x}",
            self.posix_store, self.posix_semaphore, self.sysv_store_key, self.sysv_semaphore_key
        )
    }
}

/// First four bytes of SHA-256(name || 0 || discriminator), forced positive
/// and non-zero so it never equals `IPC_PRIVATE`.
fn sysv_key(name: &RegionName, discriminator: u8) -> libc::key_t {
    let mut hasher = Sha256::new();
    hasher.update(name.as_str().as_bytes());
    hasher.update([0u8, discriminator]);
    let digest = hasher.finalize();

    let raw = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) & 0x7fff_ffff;
    let key = if raw == 0 { 1 } else { raw };
    key as libc::key_t
}

/// Hex fingerprint of a name, used in diagnostics.
pub fn fingerprint(name: &RegionName) -> String {
    let digest = Sha256::digest(name.as_str().as_bytes());
    hex::encode(&digest[..6])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> RegionName {
        RegionName::new(s).unwrap()
    }

    #[test]
    fn test_posix_names() {
        let names = ObjectNames::derive(&name("telemetry"));
        assert_eq!(names.posix_store, "/telemetry");
        assert_eq!(names.posix_semaphore, "/shmlink.lock.telemetry");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            ObjectNames::derive(&name("telemetry")),
            ObjectNames::derive(&name("telemetry"))
        );
    }

    #[test]
    fn test_store_and_semaphore_disjoint() {
        for n in ["a", "telemetry", "shmlink.lock.a", "x-y_z.1"] {
            let names = ObjectNames::derive(&name(n));
            assert_ne!(names.posix_store, names.posix_semaphore);
            assert_ne!(names.sysv_store_key, names.sysv_semaphore_key);
        }
    }

    #[test]
    fn test_sysv_keys_valid() {
        for n in ["a", "b", "telemetry", "cmd-notify"] {
            let names = ObjectNames::derive(&name(n));
            assert!(names.sysv_store_key > 0);
            assert!(names.sysv_semaphore_key > 0);
        }
        assert_ne!(
            ObjectNames::derive(&name("a")).sysv_store_key,
            ObjectNames::derive(&name("b")).sysv_store_key
        );
    }

    #[test]
    fn test_fingerprint() {
        let fp = fingerprint(&name("telemetry"));
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, fingerprint(&name("telemetry")));
    }
}
