// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Backend seam: the backing store and the lock primitive.
//!
//! A region handle only talks to these two traits. `BackendKind` picks the
//! implementation at construction time.

use std::ptr::NonNull;
use std::time::Duration;

use crate::error::{RegionError, RegionResult};
use crate::shm::naming::ObjectNames;
use crate::shm::{posix, sysv};
use crate::types::{BackendKind, RegionName};

/// Mapped shared-memory object.
pub(crate) trait BackingStore: Send {
    /// Start of the mapping.
    fn base(&self) -> NonNull<u8>;

    /// Mapped length in bytes.
    fn len(&self) -> usize;

    /// False once the creator (or a cleanup) has removed the OS object,
    /// even though this process still has it mapped.
    fn is_linked(&self) -> RegionResult<bool>;

    /// Remove the OS object host-wide. Creator only.
    fn remove(&self) -> RegionResult<()>;

    /// Unmap and release local resources.
    fn close(self: Box<Self>) -> RegionResult<()>;
}

/// Named counting semaphore used as the region's only lock.
pub(crate) trait RegionLock: Send {
    /// Block until acquired.
    fn wait(&self) -> RegionResult<()>;

    /// Wait up to `timeout`. `Ok(false)` on timeout.
    fn wait_timeout(&self, timeout: Duration) -> RegionResult<bool>;

    /// Release. Not ownership-checked.
    fn post(&self) -> RegionResult<()>;

    /// Remove the OS semaphore host-wide. Creator only.
    fn remove(&self) -> RegionResult<()>;

    /// Release the local handle.
    fn close(self: Box<Self>) -> RegionResult<()>;
}

/// Store and lock for one region.
pub(crate) struct Parts {
    pub(crate) store: Box<dyn BackingStore>,
    pub(crate) lock: Box<dyn RegionLock>,
}

/// Allocate, map and initialize a new region, then create its semaphore.
///
/// `init` runs on the fresh mapping before the semaphore exists, so no
/// attacher can observe a half-written header.
pub(crate) fn create(
    kind: BackendKind,
    name: &RegionName,
    names: &ObjectNames,
    total_size: usize,
    init: impl FnOnce(NonNull<u8>),
) -> RegionResult<Parts> {
    let store: Box<dyn BackingStore> = match kind {
        BackendKind::Posix => Box::new(posix::PosixStore::create(
            name.as_str(),
            &names.posix_store,
            total_size,
        )?),
        BackendKind::Sysv => Box::new(sysv::SysvStore::create(
            name.as_str(),
            names.sysv_store_key,
            total_size,
        )?),
    };

    init(store.base());

    let lock: RegionResult<Box<dyn RegionLock>> = match kind {
        BackendKind::Posix => posix::PosixSemaphore::create(name.as_str(), &names.posix_semaphore)
            .map(|s| Box::new(s) as Box<dyn RegionLock>),
        BackendKind::Sysv => sysv::SysvSemaphore::create(name.as_str(), names.sysv_semaphore_key)
            .map(|s| Box::new(s) as Box<dyn RegionLock>),
    };

    match lock {
        Ok(lock) => Ok(Parts { store, lock }),
        Err(e) => {
            // Roll back the store we just created.
            let _ = store.remove();
            let _ = store.close();
            Err(e)
        }
    }
}

/// Open and map an existing region and its semaphore.
pub(crate) fn attach(
    kind: BackendKind,
    name: &RegionName,
    names: &ObjectNames,
) -> RegionResult<Parts> {
    let store: Box<dyn BackingStore> = match kind {
        BackendKind::Posix => Box::new(posix::PosixStore::attach(
            name.as_str(),
            &names.posix_store,
        )?),
        BackendKind::Sysv => Box::new(sysv::SysvStore::attach(
            name.as_str(),
            names.sysv_store_key,
        )?),
    };

    let lock: RegionResult<Box<dyn RegionLock>> = match kind {
        BackendKind::Posix => posix::PosixSemaphore::open(name.as_str(), &names.posix_semaphore)
            .map(|s| Box::new(s) as Box<dyn RegionLock>),
        BackendKind::Sysv => sysv::SysvSemaphore::open(name.as_str(), names.sysv_semaphore_key)
            .map(|s| Box::new(s) as Box<dyn RegionLock>),
    };

    match lock {
        Ok(lock) => Ok(Parts { store, lock }),
        Err(e) => {
            let _ = store.close();
            Err(e)
        }
    }
}

/// What `cleanup` removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub store_removed: bool,
    pub semaphore_removed: bool,
}

/// Remove objects leaked by a creator that exited without teardown.
///
/// Missing objects are not an error. Never run this while the creator is
/// alive: attachers would lose the region.
pub fn cleanup(name: &RegionName, kind: BackendKind) -> RegionResult<CleanupReport> {
    let names = ObjectNames::derive(name);
    let report = match kind {
        BackendKind::Posix => CleanupReport {
            store_removed: posix::unlink_store(name.as_str(), &names.posix_store)?,
            semaphore_removed: posix::unlink_semaphore(name.as_str(), &names.posix_semaphore)?,
        },
        BackendKind::Sysv => CleanupReport {
            store_removed: sysv::remove_store_by_key(name.as_str(), names.sysv_store_key)?,
            semaphore_removed: sysv::remove_semaphore_by_key(
                name.as_str(),
                names.sysv_semaphore_key,
            )?,
        },
    };
    Ok(report)
}

pub(crate) fn not_found(name: &str, reason: impl Into<String>) -> RegionError {
    RegionError::NotFound {
        name: name.to_string(),
        reason: reason.into(),
    }
}
