// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! POSIX backend: `shm_open` + `mmap` for the store, `sem_open` for the lock.

use std::ffi::CString;
use std::fs::File;
use std::num::NonZeroUsize;
use std::os::unix::fs::MetadataExt;
use std::ptr::NonNull;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::mman::{self, MapFlags, ProtFlags};
use nix::sys::stat::Mode;

use crate::error::{RegionError, RegionResult};
use crate::shm::backend::{not_found, BackingStore, RegionLock};
use crate::shm::header::HEADER_SIZE;

/// Owner read/write.
const OBJECT_MODE: libc::mode_t = 0o600;

/// Mapped POSIX shared-memory object.
pub(crate) struct PosixStore {
    region: String,
    path: String,
    file: File,
    ptr: NonNull<u8>,
    size: usize,
}

// SAFETY: the mapping is process-wide; access is serialized by the region lock.
unsafe impl Send for PosixStore {}

impl PosixStore {
    pub(crate) fn create(region: &str, path: &str, size: usize) -> RegionResult<Self> {
        let fd = mman::shm_open(
            path,
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .map_err(|e| RegionError::Allocation {
            name: region.to_string(),
            reason: if e == Errno::EEXIST {
                format!("shared memory object {} already exists", path)
            } else {
                format!("shm_open failed: {}", e)
            },
        })?;
        let file = File::from(fd);

        if let Err(e) = file.set_len(size as u64) {
            let _ = mman::shm_unlink(path);
            return Err(RegionError::Allocation {
                name: region.to_string(),
                reason: format!("ftruncate to {} bytes failed: {}", size, e),
            });
        }

        let ptr = match map(&file, size) {
            Ok(ptr) => ptr,
            Err(e) => {
                let _ = mman::shm_unlink(path);
                return Err(RegionError::Map {
                    name: region.to_string(),
                    reason: format!("mmap failed: {}", e),
                });
            }
        };

        // SAFETY: ptr maps exactly `size` writable bytes.
        unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, size) };

        Ok(Self {
            region: region.to_string(),
            path: path.to_string(),
            file,
            ptr,
            size,
        })
    }

    pub(crate) fn attach(region: &str, path: &str) -> RegionResult<Self> {
        let fd = mman::shm_open(path, OFlag::O_RDWR, Mode::empty()).map_err(|e| {
            if e == Errno::ENOENT {
                not_found(region, format!("no shared memory object {}", path))
            } else {
                RegionError::Map {
                    name: region.to_string(),
                    reason: format!("shm_open failed: {}", e),
                }
            }
        })?;
        let file = File::from(fd);

        let size = file
            .metadata()
            .map_err(|e| RegionError::Map {
                name: region.to_string(),
                reason: format!("fstat failed: {}", e),
            })?
            .len() as usize;

        if size < HEADER_SIZE {
            // Creator has not sized the object yet.
            return Err(not_found(
                region,
                format!("object {} is {} bytes, not yet initialized", path, size),
            ));
        }

        let ptr = map(&file, size).map_err(|e| RegionError::Map {
            name: region.to_string(),
            reason: format!("mmap failed: {}", e),
        })?;

        Ok(Self {
            region: region.to_string(),
            path: path.to_string(),
            file,
            ptr,
            size,
        })
    }
}

fn map(file: &File, size: usize) -> nix::Result<NonNull<u8>> {
    let length = NonZeroUsize::new(size).ok_or(Errno::EINVAL)?;
    // SAFETY: file is an open shared-memory descriptor of at least `size` bytes.
    let ptr = unsafe {
        mman::mmap(
            None,
            length,
            ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            MapFlags::MAP_SHARED,
            file,
            0,
        )?
    };
    Ok(ptr.cast())
}

impl BackingStore for PosixStore {
    fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.size
    }

    fn is_linked(&self) -> RegionResult<bool> {
        let meta = self.file.metadata().map_err(|e| RegionError::Map {
            name: self.region.clone(),
            reason: format!("fstat failed: {}", e),
        })?;
        Ok(meta.nlink() > 0)
    }

    fn remove(&self) -> RegionResult<()> {
        mman::shm_unlink(self.path.as_str()).map_err(|e| {
            if e == Errno::ENOENT {
                not_found(&self.region, format!("{} already unlinked", self.path))
            } else {
                RegionError::Teardown {
                    name: self.region.clone(),
                    reason: format!("shm_unlink {} failed: {}", self.path, e),
                }
            }
        })
    }

    fn close(self: Box<Self>) -> RegionResult<()> {
        // SAFETY: ptr and size come from a successful mmap and are unmapped once.
        let result = unsafe { mman::munmap(self.ptr.cast(), self.size) };
        // The descriptor closes when `file` drops.
        result.map_err(|e| RegionError::Teardown {
            name: self.region.clone(),
            reason: format!("munmap failed: {}", e),
        })
    }
}

/// Remove a POSIX shared-memory object by path. `Ok(false)` if absent.
pub(crate) fn unlink_store(region: &str, path: &str) -> RegionResult<bool> {
    match mman::shm_unlink(path) {
        Ok(()) => Ok(true),
        Err(Errno::ENOENT) => Ok(false),
        Err(e) => Err(RegionError::Teardown {
            name: region.to_string(),
            reason: format!("shm_unlink {} failed: {}", path, e),
        }),
    }
}

/// Remove a POSIX named semaphore by path. `Ok(false)` if absent.
pub(crate) fn unlink_semaphore(region: &str, path: &str) -> RegionResult<bool> {
    let c_path = c_path(region, path)?;
    // SAFETY: c_path is a valid NUL-terminated string.
    if unsafe { libc::sem_unlink(c_path.as_ptr()) } == 0 {
        return Ok(true);
    }
    match Errno::last() {
        Errno::ENOENT => Ok(false),
        e => Err(RegionError::Teardown {
            name: region.to_string(),
            reason: format!("sem_unlink {} failed: {}", path, e),
        }),
    }
}

fn c_path(region: &str, path: &str) -> RegionResult<CString> {
    CString::new(path).map_err(|e| RegionError::Name {
        name: region.to_string(),
        reason: format!("Invalid OS name {}: {}", path, e),
    })
}

/// POSIX named semaphore.
pub(crate) struct PosixSemaphore {
    region: String,
    path: CString,
    sem: NonNull<libc::sem_t>,
}

// SAFETY: sem_t handles from sem_open are usable from any thread.
unsafe impl Send for PosixSemaphore {}

impl PosixSemaphore {
    /// Create with value 1 (released).
    pub(crate) fn create(region: &str, path: &str) -> RegionResult<Self> {
        let c_path = c_path(region, path)?;
        // SAFETY: c_path is valid; O_CREAT takes mode and initial value.
        let sem = unsafe {
            libc::sem_open(
                c_path.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                OBJECT_MODE as libc::c_uint,
                1 as libc::c_uint,
            )
        };
        Self::from_raw(region, c_path, sem, "create")
    }

    pub(crate) fn open(region: &str, path: &str) -> RegionResult<Self> {
        let c_path = c_path(region, path)?;
        // SAFETY: c_path is valid.
        let sem = unsafe { libc::sem_open(c_path.as_ptr(), 0) };
        Self::from_raw(region, c_path, sem, "open")
    }

    fn from_raw(
        region: &str,
        path: CString,
        sem: *mut libc::sem_t,
        operation: &'static str,
    ) -> RegionResult<Self> {
        match NonNull::new(sem) {
            Some(sem) if sem.as_ptr() != libc::SEM_FAILED => Ok(Self {
                region: region.to_string(),
                path,
                sem,
            }),
            _ => {
                let errno = Errno::last();
                if errno == Errno::ENOENT {
                    Err(not_found(
                        region,
                        format!("no semaphore {}", path.to_string_lossy()),
                    ))
                } else {
                    Err(RegionError::Semaphore {
                        name: region.to_string(),
                        operation,
                        source: errno,
                    })
                }
            }
        }
    }

    fn error(&self, operation: &'static str, source: Errno) -> RegionError {
        RegionError::Semaphore {
            name: self.region.clone(),
            operation,
            source,
        }
    }
}

impl RegionLock for PosixSemaphore {
    fn wait(&self) -> RegionResult<()> {
        loop {
            // SAFETY: sem is a live handle from sem_open.
            if unsafe { libc::sem_wait(self.sem.as_ptr()) } == 0 {
                return Ok(());
            }
            match Errno::last() {
                Errno::EINTR => continue,
                e => return Err(self.error("wait", e)),
            }
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> RegionResult<bool> {
        // sem_timedwait takes an absolute CLOCK_REALTIME deadline.
        let deadline = SystemTime::now()
            .checked_add(timeout)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .ok_or_else(|| self.error("timedwait", Errno::EINVAL))?;
        let abs = libc::timespec {
            tv_sec: deadline.as_secs() as libc::time_t,
            tv_nsec: deadline.subsec_nanos() as libc::c_long,
        };

        loop {
            // SAFETY: sem is live; abs is a valid timespec.
            if unsafe { libc::sem_timedwait(self.sem.as_ptr(), &abs) } == 0 {
                return Ok(true);
            }
            match Errno::last() {
                Errno::EINTR => continue,
                Errno::ETIMEDOUT => return Ok(false),
                e => return Err(self.error("timedwait", e)),
            }
        }
    }

    fn post(&self) -> RegionResult<()> {
        // SAFETY: sem is a live handle from sem_open.
        if unsafe { libc::sem_post(self.sem.as_ptr()) } == 0 {
            Ok(())
        } else {
            Err(self.error("post", Errno::last()))
        }
    }

    fn remove(&self) -> RegionResult<()> {
        // SAFETY: path is a valid NUL-terminated string.
        if unsafe { libc::sem_unlink(self.path.as_ptr()) } == 0 {
            return Ok(());
        }
        match Errno::last() {
            Errno::ENOENT => Err(not_found(
                &self.region,
                format!("{} already unlinked", self.path.to_string_lossy()),
            )),
            e => Err(RegionError::Teardown {
                name: self.region.clone(),
                reason: format!("sem_unlink failed: {}", e),
            }),
        }
    }

    fn close(self: Box<Self>) -> RegionResult<()> {
        // SAFETY: sem is live and closed exactly once.
        if unsafe { libc::sem_close(self.sem.as_ptr()) } == 0 {
            Ok(())
        } else {
            Err(RegionError::Teardown {
                name: self.region.clone(),
                reason: format!("sem_close failed: {}", Errno::last()),
            })
        }
    }
}
