// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Region - the public handle over one named shared-memory region.
//!
//! A Creator allocates the backing store, writes the header and creates
//! the semaphore in the released state. Attachers open both by name and
//! learn the payload size from the header. Every header or payload access
//! goes through the semaphore.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::Location;
use std::ptr::NonNull;
use std::sync::Arc;
use std::time::Duration;

use tracing::Level;

use crate::config::Config;
use crate::error::{ErrorKind, ErrorRecord, RegionError, RegionResult};
use crate::log::{self, LogSink, SharedSink};
use crate::shm::backend::{self, Parts};
use crate::shm::guard::RegionGuard;
use crate::shm::header::{HeaderPtr, HeaderSnapshot, HEADER_SIZE};
use crate::shm::naming::{fingerprint, ObjectNames};
use crate::state::{HandleState, HandleStateMachine};
use crate::types::{BackendKind, RegionName, Timestamp};

/// Default bound on the creator's teardown lock wait.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(1000);

/// Which side of the region this handle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Allocated the region; the only handle allowed to destroy it.
    Creator,
    /// Mapped an existing region; never destroys it.
    Attacher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Creator => write!(f, "creator"),
            Self::Attacher => write!(f, "attacher"),
        }
    }
}

/// Outcome of a payload copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// This many bytes were copied (always the full payload size).
    Copied(usize),
    /// Nothing to do: the region has no payload or the buffer was empty.
    Skipped,
}

/// Construction options for a region handle.
#[derive(Clone)]
pub struct RegionOptions {
    backend: BackendKind,
    teardown_timeout: Duration,
    sink: SharedSink,
}

impl RegionOptions {
    pub fn new() -> Self {
        Self {
            backend: BackendKind::default(),
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            sink: log::noop(),
        }
    }

    /// OS primitive family.
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// How long a creator waits for the lock before forcing teardown.
    pub fn teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Diagnostic sink. Defaults to [`crate::log::NoopSink`].
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Config> for RegionOptions {
    fn from(config: &Config) -> Self {
        Self::new()
            .backend(config.backend)
            .teardown_timeout(config.teardown_timeout)
    }
}

impl fmt::Debug for RegionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionOptions")
            .field("backend", &self.backend)
            .field("teardown_timeout", &self.teardown_timeout)
            .finish_non_exhaustive()
    }
}

/// Handle to a named shared-memory region.
///
/// `Send` but not `Sync`: to use a region from several threads, give each
/// thread its own attached handle.
pub struct Region {
    name: RegionName,
    role: Role,
    options: RegionOptions,
    names: ObjectNames,
    parts: Option<Parts>,
    header: HeaderPtr,
    base: NonNull<u8>,
    length: usize,
    state: RefCell<HandleStateMachine>,
    last_error: Cell<Option<ErrorRecord>>,
    last_observed: Cell<Timestamp>,
}

// SAFETY: the raw pointers refer to a process-wide mapping owned by `parts`,
// which is itself Send. Interior mutability is not shared across threads
// because Region is not Sync.
unsafe impl Send for Region {}

impl Region {
    /// Create a region with a `payload_len`-byte payload, default options.
    pub fn create(name: &str, payload_len: usize) -> RegionResult<Self> {
        Self::create_with(name, payload_len, RegionOptions::default())
    }

    /// Create a region with explicit options.
    ///
    /// Fails if an object with the derived name already exists, including
    /// one leaked by a crashed creator (see [`crate::shm::cleanup`]).
    pub fn create_with(
        name: &str,
        payload_len: usize,
        options: RegionOptions,
    ) -> RegionResult<Self> {
        let name = RegionName::new(name)?;
        let names = ObjectNames::derive(&name);

        let total = HEADER_SIZE
            .checked_add(payload_len)
            .ok_or_else(|| RegionError::Allocation {
                name: name.to_string(),
                reason: format!("payload of {} bytes overflows the region size", payload_len),
            })?;

        let parts = backend::create(options.backend, &name, &names, total, |base| {
            // SAFETY: base maps `total >= HEADER_SIZE` fresh bytes, page aligned.
            unsafe { HeaderPtr::new(base) }.initialize(total)
        })?;

        options.sink.log(
            Level::DEBUG,
            &format!(
                "Created region {} ({} backend, {} payload bytes, id {})",
                name,
                options.backend,
                payload_len,
                fingerprint(&name)
            ),
        );

        Ok(Self::from_parts(name, Role::Creator, options, names, parts, total))
    }

    /// Attach to an existing region, default options.
    pub fn attach(name: &str) -> RegionResult<Self> {
        Self::attach_with(name, RegionOptions::default())
    }

    /// Attach to an existing region with explicit options. The backend must
    /// match the creator's.
    pub fn attach_with(name: &str, options: RegionOptions) -> RegionResult<Self> {
        let name = RegionName::new(name)?;
        let names = ObjectNames::derive(&name);
        let parts = backend::attach(options.backend, &name, &names)?;

        let mapped = parts.store.len();
        // SAFETY: attach rejects mappings shorter than HEADER_SIZE.
        let length = unsafe { HeaderPtr::new(parts.store.base()) }.length();

        let invalid = if length == 0 {
            Some(backend::not_found(
                name.as_str(),
                "region exists but its creator has not initialized it",
            ))
        } else if length < HEADER_SIZE || length > mapped {
            Some(RegionError::Map {
                name: name.to_string(),
                reason: format!(
                    "header length {} is inconsistent with mapping of {} bytes",
                    length, mapped
                ),
            })
        } else {
            None
        };
        if let Some(err) = invalid {
            let _ = parts.lock.close();
            let _ = parts.store.close();
            return Err(err);
        }

        options.sink.log(
            Level::DEBUG,
            &format!(
                "Attached region {} ({} backend, {} payload bytes)",
                name,
                options.backend,
                length - HEADER_SIZE
            ),
        );

        let region = Self::from_parts(name, Role::Attacher, options, names, parts, length);
        // Only updates after attach count toward the first delta_check.
        region.last_observed.set(region.header.last_update());
        Ok(region)
    }

    fn from_parts(
        name: RegionName,
        role: Role,
        options: RegionOptions,
        names: ObjectNames,
        parts: Parts,
        length: usize,
    ) -> Self {
        let base = parts.store.base();
        Self {
            state: RefCell::new(HandleStateMachine::new(name.clone())),
            name,
            role,
            options,
            names,
            parts: Some(parts),
            // SAFETY: the mapping holds at least HEADER_SIZE bytes and lives
            // as long as `parts`.
            header: unsafe { HeaderPtr::new(base) },
            base,
            length,
            last_error: Cell::new(None),
            last_observed: Cell::new(Timestamp::default()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn name(&self) -> &RegionName {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn backend(&self) -> BackendKind {
        self.options.backend
    }

    /// OS identifiers derived from the name.
    pub fn object_names(&self) -> &ObjectNames {
        &self.names
    }

    /// Header plus payload bytes.
    pub fn total_len(&self) -> usize {
        self.length
    }

    pub fn payload_len(&self) -> usize {
        self.length - HEADER_SIZE
    }

    pub fn state(&self) -> HandleState {
        self.state.borrow().state()
    }

    /// Failure recorded by the most recent public call, if it failed.
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.last_error.get()
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Block until this handle holds the region lock.
    ///
    /// Blocks forever if a holder died without releasing; there is no
    /// recovery for that case.
    #[track_caller]
    pub fn lock(&self) -> RegionResult<RegionGuard<'_>> {
        self.last_error.set(None);
        let result = self.acquire();
        self.track(result)
    }

    /// Like [`Region::lock`] but gives up after `timeout`.
    /// `Ok(None)` means the lock was not acquired in time.
    #[track_caller]
    pub fn try_lock_for(&self, timeout: Duration) -> RegionResult<Option<RegionGuard<'_>>> {
        self.last_error.set(None);
        let result = self.acquire_within(Some(timeout));
        self.track(result)
    }

    fn acquire(&self) -> RegionResult<RegionGuard<'_>> {
        let parts = self.ready_parts()?;
        if let Err(e) = parts.lock.wait() {
            return Err(self.lock_failed(e));
        }
        self.confirm_linked(parts)
    }

    fn acquire_within(&self, timeout: Option<Duration>) -> RegionResult<Option<RegionGuard<'_>>> {
        let Some(timeout) = timeout else {
            return self.acquire().map(Some);
        };
        let parts = self.ready_parts()?;
        match parts.lock.wait_timeout(timeout) {
            Ok(true) => self.confirm_linked(parts).map(Some),
            Ok(false) => Ok(None),
            Err(e) => Err(self.lock_failed(e)),
        }
    }

    fn lock_failed(&self, e: RegionError) -> RegionError {
        if e.kind() == ErrorKind::NotFound {
            self.mark_closed();
        }
        e
    }

    /// With the lock held, make sure the creator has not removed the region
    /// while we waited. Releases the lock on failure.
    fn confirm_linked(&self, parts: &Parts) -> RegionResult<RegionGuard<'_>> {
        match parts.store.is_linked() {
            Ok(true) => Ok(RegionGuard::new(self)),
            Ok(false) => {
                let _ = parts.lock.post();
                self.mark_closed();
                self.options.sink.log(
                    Level::WARN,
                    &format!("Region {} was removed by its creator", self.name),
                );
                Err(backend::not_found(
                    self.name.as_str(),
                    "region was removed by its creator",
                ))
            }
            Err(e) => {
                let _ = parts.lock.post();
                Err(e)
            }
        }
    }

    fn ready_parts(&self) -> RegionResult<&Parts> {
        match (&self.parts, self.state()) {
            (Some(parts), HandleState::Ready) => Ok(parts),
            _ => Err(RegionError::NoObject {
                name: self.name.to_string(),
            }),
        }
    }

    pub(crate) fn release(&self) -> RegionResult<()> {
        match &self.parts {
            Some(parts) => parts.lock.post(),
            None => Err(RegionError::NoObject {
                name: self.name.to_string(),
            }),
        }
    }

    // =========================================================================
    // Header and payload operations
    // =========================================================================

    /// Stamp the header with the current time.
    #[track_caller]
    pub fn update_time(&self) -> RegionResult<()> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|mut guard| {
            guard.stamp();
            guard.unlock()
        });
        self.track(result)
    }

    /// Stamp the header and keep the lock for a following write.
    #[track_caller]
    pub fn update_time_and_hold(&self) -> RegionResult<RegionGuard<'_>> {
        self.last_error.set(None);
        let result = self.acquire().map(|mut guard| {
            guard.stamp();
            guard
        });
        self.track(result)
    }

    /// Write the scalar, stamp the time and raise LAM.
    #[track_caller]
    pub fn put_scalar(&self, value: f64) -> RegionResult<()> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|mut guard| {
            guard.stamp();
            guard.set_scalar(value);
            guard.set_notify(true);
            guard.unlock()
        });
        self.track(result)
    }

    #[track_caller]
    pub fn get_scalar(&self) -> RegionResult<f64> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|guard| {
            let value = guard.scalar();
            guard.unlock().map(|()| value)
        });
        self.track(result)
    }

    /// Copy `buf` into the payload, stamp the time and raise LAM.
    ///
    /// `buf` must be exactly [`Region::payload_len`] bytes. An empty buffer
    /// or a header-only region is `Transfer::Skipped` and touches nothing.
    #[track_caller]
    pub fn put_payload(&self, buf: &[u8]) -> RegionResult<Transfer> {
        self.last_error.set(None);
        let result = self.put_payload_inner(buf);
        self.track(result)
    }

    fn put_payload_inner(&self, buf: &[u8]) -> RegionResult<Transfer> {
        self.ready_parts()?;
        let expected = self.payload_len();
        if expected == 0 || buf.is_empty() {
            return Ok(Transfer::Skipped);
        }
        self.check_len(expected, buf.len())?;

        let mut guard = self.acquire()?;
        guard.stamp();
        guard.payload_mut().copy_from_slice(buf);
        guard.set_notify(true);
        guard.unlock()?;
        Ok(Transfer::Copied(expected))
    }

    /// Copy the payload into `dst`, which must be exactly
    /// [`Region::payload_len`] bytes. Empty `dst` or a header-only region is
    /// `Transfer::Skipped`.
    #[track_caller]
    pub fn get_payload(&self, dst: &mut [u8]) -> RegionResult<Transfer> {
        self.last_error.set(None);
        let result = self.get_payload_inner(dst);
        self.track(result)
    }

    fn get_payload_inner(&self, dst: &mut [u8]) -> RegionResult<Transfer> {
        self.ready_parts()?;
        let expected = self.payload_len();
        if expected == 0 || dst.is_empty() {
            return Ok(Transfer::Skipped);
        }
        self.check_len(expected, dst.len())?;

        let guard = self.acquire()?;
        dst.copy_from_slice(guard.payload());
        guard.unlock()?;
        Ok(Transfer::Copied(expected))
    }

    /// Copy of the whole payload.
    #[track_caller]
    pub fn read_payload(&self) -> RegionResult<Vec<u8>> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|guard| {
            let bytes = guard.payload().to_vec();
            guard.unlock().map(|()| bytes)
        });
        self.track(result)
    }

    fn check_len(&self, expected: usize, actual: usize) -> RegionResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(RegionError::PayloadSize {
                name: self.name.to_string(),
                expected,
                actual,
            })
        }
    }

    /// Seconds since the last stamp.
    ///
    /// `now` is taken before the lock, so a writer that stamps in between
    /// makes the result slightly negative.
    #[track_caller]
    pub fn time_since_last_update(&self) -> RegionResult<f64> {
        self.last_error.set(None);
        let now = Timestamp::now();
        let result = self.acquire().and_then(|guard| {
            let last = guard.last_update();
            guard.unlock().map(|()| now.seconds_since(last))
        });
        self.track(result)
    }

    /// Seconds between the header stamp and the stamp this handle saw on its
    /// previous call; remembers the current stamp for the next call.
    ///
    /// The first call on an attacher measures from the stamp present at
    /// attach time; on a creator, from zero.
    #[track_caller]
    pub fn delta_check(&self) -> RegionResult<f64> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|guard| {
            let last = guard.last_update();
            guard.unlock().map(|()| last)
        });
        let result = result.map(|last| {
            let delta = last.seconds_since(self.last_observed.get());
            self.last_observed.set(last);
            delta
        });
        self.track(result)
    }

    /// Set or clear the LAM (look-at-me) flag.
    #[track_caller]
    pub fn set_lam(&self, value: bool) -> RegionResult<()> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|mut guard| {
            guard.set_notify(value);
            guard.unlock()
        });
        self.track(result)
    }

    #[track_caller]
    pub fn get_lam(&self) -> RegionResult<bool> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|guard| {
            let value = guard.notify();
            guard.unlock().map(|()| value)
        });
        self.track(result)
    }

    /// All header fields, read under one lock.
    #[track_caller]
    pub fn snapshot(&self) -> RegionResult<HeaderSnapshot> {
        self.last_error.set(None);
        let result = self.acquire().and_then(|guard| {
            let snap = guard.snapshot();
            guard.unlock().map(|()| snap)
        });
        self.track(result)
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Unmap the region. A creator also removes the store and semaphore
    /// host-wide, after waiting at most the teardown timeout for the lock.
    #[track_caller]
    pub fn close(mut self) -> RegionResult<()> {
        self.last_error.set(None);
        let result = self.teardown();
        self.track(result)
    }

    fn teardown(&mut self) -> RegionResult<()> {
        let Some(parts) = self.parts.take() else {
            return Ok(());
        };
        let sink = self.options.sink.clone();
        let state = self.state.get_mut();
        if state.state() == HandleState::Ready {
            let _ = state.transition_to(HandleState::Destroying);
        }

        let mut failures: Vec<String> = Vec::new();
        let mut note = |result: RegionResult<()>, what: &str| match result {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                sink.log(Level::WARN, &format!("{}: {}", what, e));
            }
            Err(e) => {
                sink.log(Level::ERROR, &format!("{}: {}", what, e));
                failures.push(e.to_string());
            }
        };

        if self.role == Role::Creator {
            let held = match parts.lock.wait_timeout(self.options.teardown_timeout) {
                Ok(held) => {
                    if !held {
                        sink.log(
                            Level::WARN,
                            &format!(
                                "Lock on {} not released within {:?}; forcing teardown",
                                self.name, self.options.teardown_timeout
                            ),
                        );
                    }
                    held
                }
                Err(e) => {
                    sink.log(Level::WARN, &format!("Teardown lock wait failed: {}", e));
                    false
                }
            };

            note(parts.store.remove(), "remove store");
            // Waiters wake, see the store gone and fail with NotFound.
            if held {
                let _ = parts.lock.post();
            }
            note(parts.lock.remove(), "remove semaphore");
        }

        note(parts.store.close(), "unmap store");
        note(parts.lock.close(), "close semaphore");

        let _ = self.state.get_mut().transition_to(HandleState::Closed);
        sink.log(
            Level::DEBUG,
            &format!("Closed region {} as {}", self.name, self.role),
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RegionError::Teardown {
                name: self.name.to_string(),
                reason: failures.join("; "),
            })
        }
    }

    // =========================================================================
    // Internals shared with the guard
    // =========================================================================

    pub(crate) fn header(&self) -> HeaderPtr {
        self.header
    }

    pub(crate) fn payload_ptr(&self) -> *mut u8 {
        // SAFETY: HEADER_SIZE <= length, inside the mapping.
        unsafe { self.base.as_ptr().add(HEADER_SIZE) }
    }

    pub(crate) fn sink(&self) -> &dyn LogSink {
        self.options.sink.as_ref()
    }

    pub(crate) fn record(&self, record: ErrorRecord) {
        self.last_error.set(Some(record));
    }

    fn mark_closed(&self) {
        let _ = self
            .state
            .borrow_mut()
            .transition_to(HandleState::Closed);
    }

    #[track_caller]
    fn track<T>(&self, result: RegionResult<T>) -> RegionResult<T> {
        if let Err(e) = &result {
            self.record(ErrorRecord {
                kind: e.kind(),
                location: Location::caller(),
            });
        }
        result
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("backend", &self.options.backend)
            .field("length", &self.length)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            self.options
                .sink
                .log(Level::ERROR, &format!("Region teardown failed: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::log::testing::MemorySink;

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn unique(prefix: &str) -> String {
        format!(
            "{}-{}-{}",
            prefix,
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn test_create_rejects_bad_name() {
        let err = Region::create("", 8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Name);
        let err = Region::create("bad/name", 8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Name);
    }

    #[test]
    fn test_create_reports_sizes() {
        let region = Region::create(&unique("sizes"), 24).unwrap();
        assert_eq!(region.role(), Role::Creator);
        assert_eq!(region.payload_len(), 24);
        assert_eq!(region.total_len(), HEADER_SIZE + 24);
        assert_eq!(region.state(), HandleState::Ready);
        assert!(region.last_error().is_none());
    }

    #[test]
    fn test_fresh_header_is_zeroed() {
        let region = Region::create(&unique("fresh"), 4).unwrap();
        let snap = region.snapshot().unwrap();
        assert_eq!(snap.length, HEADER_SIZE + 4);
        assert!(snap.last_update.is_unset());
        assert_eq!(snap.scalar, 0.0);
        assert!(!snap.notify);
        assert_eq!(region.read_payload().unwrap(), vec![0u8; 4]);
    }

    #[test]
    fn test_duplicate_create_fails() {
        let name = unique("dup");
        let _first = Region::create(&name, 8).unwrap();
        let err = Region::create(&name, 8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Allocation);
    }

    #[test]
    fn test_semaphore_starts_released() {
        let region = Region::create(&unique("released"), 0).unwrap();
        let guard = region.try_lock_for(Duration::from_millis(100)).unwrap();
        assert!(guard.is_some());
    }

    #[test]
    fn test_put_scalar_raises_lam() {
        let region = Region::create(&unique("scalar"), 0).unwrap();
        region.put_scalar(42.5).unwrap();
        assert_eq!(region.get_scalar().unwrap(), 42.5);
        assert!(region.get_lam().unwrap());
        region.set_lam(false).unwrap();
        assert!(!region.get_lam().unwrap());
    }

    #[test]
    fn test_payload_size_mismatch_recorded() {
        let region = Region::create(&unique("mismatch"), 8).unwrap();
        let err = region.put_payload(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PayloadSize);

        let record = region.last_error().expect("error recorded");
        assert_eq!(record.kind, ErrorKind::PayloadSize);
        assert!(record.location.file().ends_with("region.rs"));

        // The next successful call clears it.
        region.put_payload(&[0u8; 8]).unwrap();
        assert!(region.last_error().is_none());
    }

    #[test]
    fn test_skipped_transfers() {
        let empty = Region::create(&unique("empty"), 0).unwrap();
        assert_eq!(empty.put_payload(&[1, 2]).unwrap(), Transfer::Skipped);
        assert_eq!(empty.get_payload(&mut [0u8; 2]).unwrap(), Transfer::Skipped);
        assert!(!empty.get_lam().unwrap());

        let sized = Region::create(&unique("sized"), 4).unwrap();
        assert_eq!(sized.put_payload(&[]).unwrap(), Transfer::Skipped);
        assert_eq!(sized.get_payload(&mut []).unwrap(), Transfer::Skipped);
        assert!(!sized.get_lam().unwrap());
    }

    #[test]
    fn test_update_time_and_hold_keeps_lock() {
        let region = Region::create(&unique("hold"), 2).unwrap();
        let mut guard = region.update_time_and_hold().unwrap();
        guard.payload_mut().copy_from_slice(&[7, 9]);
        assert!(!guard.last_update().is_unset());
        guard.unlock().unwrap();
        assert_eq!(region.read_payload().unwrap(), vec![7, 9]);
    }

    #[test]
    fn test_delta_check_second_call_is_zero() {
        let region = Region::create(&unique("delta"), 0).unwrap();
        region.update_time().unwrap();
        let first = region.delta_check().unwrap();
        assert!(first > 0.0);
        let second = region.delta_check().unwrap();
        assert_eq!(second, 0.0);
    }

    #[test]
    fn test_close_logs_through_sink() {
        let sink = Arc::new(MemorySink::default());
        let region = Region::create_with(
            &unique("sink"),
            0,
            RegionOptions::new().sink(sink.clone()),
        )
        .unwrap();
        region.close().unwrap();

        let entries = sink.entries.lock().unwrap();
        assert!(entries.iter().any(|(_, m)| m.starts_with("Created region")));
        assert!(entries.iter().any(|(_, m)| m.starts_with("Closed region")));
    }

    #[test]
    fn test_options_from_config() {
        let config = crate::ConfigLoader::load_string(
            "backend: sysv\nteardown_timeout_ms: 50\nregions:\n  - name: r\n",
        )
        .unwrap();
        let options = RegionOptions::from(&config);
        assert_eq!(options.backend, BackendKind::Sysv);
        assert_eq!(options.teardown_timeout, Duration::from_millis(50));
    }
}
