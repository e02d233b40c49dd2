// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Region header layout.
//!
//! ```text
//! offset  field               type
//! 0       length              usize (header + payload bytes)
//! 8       last_update_secs    i64
//! 16      last_update_nanos   i64
//! 24      scalar              f64
//! 32      notify (LAM)        u8
//! 33..40  padding
//! 40      payload[length - 40]
//! ```
//!
//! Offsets shown for 64-bit targets. Every access except the attach-time
//! read of `length` happens with the region semaphore held.

use std::ptr::{self, NonNull};

use serde::Serialize;

use crate::types::Timestamp;

/// Header stored at offset 0 of every region.
#[repr(C)]
pub(crate) struct RegionHeader {
    length: usize,
    last_update_secs: i64,
    last_update_nanos: i64,
    scalar: f64,
    notify: u8,
}

/// Size of the header; the payload starts right after it.
pub const HEADER_SIZE: usize = std::mem::size_of::<RegionHeader>();

#[cfg(target_pointer_width = "64")]
const _: () = assert!(HEADER_SIZE == 40);

/// Copy of every header field, read under one lock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderSnapshot {
    pub length: usize,
    pub last_update: Timestamp,
    pub scalar: f64,
    pub notify: bool,
}

impl HeaderSnapshot {
    pub fn payload_len(&self) -> usize {
        self.length.saturating_sub(HEADER_SIZE)
    }
}

/// Pointer to a header living in mapped memory.
///
/// Reads and writes are volatile: another process may change the bytes
/// between two accesses.
#[derive(Clone, Copy)]
pub(crate) struct HeaderPtr(NonNull<RegionHeader>);

impl HeaderPtr {
    /// # Safety
    /// `base` must point to at least `HEADER_SIZE` mapped, writable bytes
    /// aligned for `usize`, valid for as long as the returned value is used.
    pub(crate) unsafe fn new(base: NonNull<u8>) -> Self {
        Self(base.cast())
    }

    fn raw(&self) -> *mut RegionHeader {
        self.0.as_ptr()
    }

    /// Zero the header and record the total region length.
    pub(crate) fn initialize(&self, length: usize) {
        // SAFETY: HeaderPtr::new guarantees HEADER_SIZE writable bytes.
        unsafe {
            ptr::write_bytes(self.raw() as *mut u8, 0, HEADER_SIZE);
            ptr::write_volatile(ptr::addr_of_mut!((*self.raw()).length), length);
        }
    }

    pub(crate) fn length(&self) -> usize {
        // SAFETY: see HeaderPtr::new.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.raw()).length)) }
    }

    pub(crate) fn last_update(&self) -> Timestamp {
        // SAFETY: see HeaderPtr::new.
        unsafe {
            Timestamp {
                secs: ptr::read_volatile(ptr::addr_of!((*self.raw()).last_update_secs)),
                nanos: ptr::read_volatile(ptr::addr_of!((*self.raw()).last_update_nanos)),
            }
        }
    }

    pub(crate) fn set_last_update(&self, ts: Timestamp) {
        // SAFETY: see HeaderPtr::new.
        unsafe {
            ptr::write_volatile(ptr::addr_of_mut!((*self.raw()).last_update_secs), ts.secs);
            ptr::write_volatile(ptr::addr_of_mut!((*self.raw()).last_update_nanos), ts.nanos);
        }
    }

    pub(crate) fn scalar(&self) -> f64 {
        // SAFETY: see HeaderPtr::new.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.raw()).scalar)) }
    }

    pub(crate) fn set_scalar(&self, value: f64) {
        // SAFETY: see HeaderPtr::new.
        unsafe { ptr::write_volatile(ptr::addr_of_mut!((*self.raw()).scalar), value) }
    }

    pub(crate) fn notify(&self) -> bool {
        // Any non-zero byte counts as set.
        // SAFETY: see HeaderPtr::new.
        unsafe { ptr::read_volatile(ptr::addr_of!((*self.raw()).notify)) != 0 }
    }

    pub(crate) fn set_notify(&self, value: bool) {
        // SAFETY: see HeaderPtr::new.
        unsafe { ptr::write_volatile(ptr::addr_of_mut!((*self.raw()).notify), u8::from(value)) }
    }

    pub(crate) fn snapshot(&self) -> HeaderSnapshot {
        HeaderSnapshot {
            length: self.length(),
            last_update: self.last_update(),
            scalar: self.scalar(),
            notify: self.notify(),
        }
    }
}
