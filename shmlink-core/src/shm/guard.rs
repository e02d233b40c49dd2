// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Scoped lock over a region.
//!
//! Holding a `RegionGuard` means holding the region semaphore. Payload
//! slices borrow from the guard, so they cannot outlive the lock.

use std::panic::Location;

use tracing::Level;

use crate::error::{ErrorRecord, RegionResult};
use crate::shm::header::HeaderSnapshot;
use crate::shm::region::Region;
use crate::types::Timestamp;

/// Exclusive access to a region's header and payload.
///
/// Dropping the guard releases the semaphore. Use [`RegionGuard::unlock`]
/// to observe a release failure. Calling other `Region` methods while a
/// guard is alive deadlocks: the semaphore is not reentrant.
pub struct RegionGuard<'a> {
    region: &'a Region,
    held: bool,
}

impl<'a> RegionGuard<'a> {
    pub(crate) fn new(region: &'a Region) -> Self {
        Self { region, held: true }
    }

    /// Payload bytes, empty for a header-only region.
    pub fn payload(&self) -> &[u8] {
        let len = self.region.payload_len();
        if len == 0 {
            return &[];
        }
        // SAFETY: the payload lies inside the mapping and the lock is held.
        unsafe { std::slice::from_raw_parts(self.region.payload_ptr(), len) }
    }

    /// Mutable payload bytes, empty for a header-only region.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        let len = self.region.payload_len();
        if len == 0 {
            return &mut [];
        }
        // SAFETY: the payload lies inside the mapping, the lock is held and
        // `&mut self` rules out a second slice from this guard.
        unsafe { std::slice::from_raw_parts_mut(self.region.payload_ptr(), len) }
    }

    pub fn last_update(&self) -> Timestamp {
        self.region.header().last_update()
    }

    /// Set the header timestamp to now.
    pub fn stamp(&mut self) -> Timestamp {
        let now = Timestamp::now();
        self.region.header().set_last_update(now);
        now
    }

    pub fn scalar(&self) -> f64 {
        self.region.header().scalar()
    }

    pub fn set_scalar(&mut self, value: f64) {
        self.region.header().set_scalar(value);
    }

    /// The LAM (look-at-me) flag.
    pub fn notify(&self) -> bool {
        self.region.header().notify()
    }

    pub fn set_notify(&mut self, value: bool) {
        self.region.header().set_notify(value);
    }

    pub fn snapshot(&self) -> HeaderSnapshot {
        self.region.header().snapshot()
    }

    /// Release the lock, reporting a failed post.
    pub fn unlock(mut self) -> RegionResult<()> {
        self.held = false;
        self.region.release()
    }
}

impl Drop for RegionGuard<'_> {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        if let Err(e) = self.region.release() {
            self.region.record(ErrorRecord {
                kind: e.kind(),
                location: Location::caller(),
            });
            self.region
                .sink()
                .log(Level::ERROR, &format!("Failed to release lock: {}", e));
        }
    }
}
