// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! System V backend: `shmget` + `shmat` for the store, a one-element
//! `semget` set for the lock.

use std::ptr::{self, NonNull};
use std::time::{Duration, Instant};

use nix::errno::Errno;

use crate::error::{RegionError, RegionResult};
use crate::shm::backend::{not_found, BackingStore, RegionLock};
use crate::shm::header::HEADER_SIZE;

/// Owner read/write.
const OBJECT_MODE: libc::c_int = 0o600;

/// `shm_perm.mode` bit set once IPC_RMID was issued on an attached segment.
const SHM_DEST: u32 = 0o1000;

/// Poll interval for the bounded semaphore wait.
const TIMED_WAIT_POLL: Duration = Duration::from_millis(1);

/// Attached System V shared-memory segment.
pub(crate) struct SysvStore {
    region: String,
    id: libc::c_int,
    ptr: NonNull<u8>,
    size: usize,
}

// SAFETY: the attachment is process-wide; access is serialized by the region lock.
unsafe impl Send for SysvStore {}

impl SysvStore {
    pub(crate) fn create(region: &str, key: libc::key_t, size: usize) -> RegionResult<Self> {
        // SAFETY: plain syscall wrapper.
        let id = unsafe {
            libc::shmget(
                key,
                size,
                libc::IPC_CREAT | libc::IPC_EXCL | OBJECT_MODE,
            )
        };
        if id < 0 {
            let errno = Errno::last();
            return Err(RegionError::Allocation {
                name: region.to_string(),
                reason: if errno == Errno::EEXIST {
                    format!("segment with key {:#010x} already exists", key)
                } else {
                    format!("shmget failed: {}", errno)
                },
            });
        }

        let ptr = match attach_segment(id) {
            Ok(ptr) => ptr,
            Err(errno) => {
                rmid_segment(id);
                return Err(RegionError::Map {
                    name: region.to_string(),
                    reason: format!("shmat failed: {}", errno),
                });
            }
        };

        // SAFETY: the segment is at least `size` bytes and attached read/write.
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };

        Ok(Self {
            region: region.to_string(),
            id,
            ptr,
            size,
        })
    }

    pub(crate) fn attach(region: &str, key: libc::key_t) -> RegionResult<Self> {
        // SAFETY: plain syscall wrapper.
        let id = unsafe { libc::shmget(key, 0, OBJECT_MODE) };
        if id < 0 {
            let errno = Errno::last();
            return Err(if errno == Errno::ENOENT {
                not_found(region, format!("no segment with key {:#010x}", key))
            } else {
                RegionError::Map {
                    name: region.to_string(),
                    reason: format!("shmget failed: {}", errno),
                }
            });
        }

        let ds = stat_segment(id).map_err(|errno| RegionError::Map {
            name: region.to_string(),
            reason: format!("shmctl(IPC_STAT) failed: {}", errno),
        })?;
        let size = ds.shm_segsz as usize;
        if size < HEADER_SIZE {
            return Err(not_found(
                region,
                format!("segment is {} bytes, smaller than the header", size),
            ));
        }
        if u32::from(ds.shm_perm.mode) & SHM_DEST != 0 {
            return Err(not_found(region, "segment is marked for destruction"));
        }

        let ptr = attach_segment(id).map_err(|errno| RegionError::Map {
            name: region.to_string(),
            reason: format!("shmat failed: {}", errno),
        })?;

        Ok(Self {
            region: region.to_string(),
            id,
            ptr,
            size,
        })
    }
}

fn attach_segment(id: libc::c_int) -> Result<NonNull<u8>, Errno> {
    // SAFETY: id names an existing segment; the kernel picks the address.
    let addr = unsafe { libc::shmat(id, ptr::null(), 0) };
    if addr as isize == -1 {
        return Err(Errno::last());
    }
    NonNull::new(addr as *mut u8).ok_or(Errno::EINVAL)
}

fn stat_segment(id: libc::c_int) -> Result<libc::shmid_ds, Errno> {
    // SAFETY: shmid_ds is plain old data; the kernel fills it in.
    let mut ds: libc::shmid_ds = unsafe { std::mem::zeroed() };
    // SAFETY: ds is a valid out-pointer.
    if unsafe { libc::shmctl(id, libc::IPC_STAT, &mut ds) } < 0 {
        return Err(Errno::last());
    }
    Ok(ds)
}

fn rmid_segment(id: libc::c_int) -> libc::c_int {
    // SAFETY: IPC_RMID ignores the buffer argument.
    unsafe { libc::shmctl(id, libc::IPC_RMID, ptr::null_mut()) }
}

impl BackingStore for SysvStore {
    fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    fn len(&self) -> usize {
        self.size
    }

    fn is_linked(&self) -> RegionResult<bool> {
        match stat_segment(self.id) {
            Ok(ds) => Ok(u32::from(ds.shm_perm.mode) & SHM_DEST == 0),
            Err(Errno::EIDRM) | Err(Errno::EINVAL) => Ok(false),
            Err(e) => Err(RegionError::Map {
                name: self.region.clone(),
                reason: format!("shmctl(IPC_STAT) failed: {}", e),
            }),
        }
    }

    fn remove(&self) -> RegionResult<()> {
        if rmid_segment(self.id) == 0 {
            return Ok(());
        }
        match Errno::last() {
            Errno::EIDRM | Errno::EINVAL => {
                Err(not_found(&self.region, "segment already removed"))
            }
            e => Err(RegionError::Teardown {
                name: self.region.clone(),
                reason: format!("shmctl(IPC_RMID) failed: {}", e),
            }),
        }
    }

    fn close(self: Box<Self>) -> RegionResult<()> {
        // SAFETY: ptr was returned by shmat and is detached once.
        if unsafe { libc::shmdt(self.ptr.as_ptr() as *const libc::c_void) } == 0 {
            Ok(())
        } else {
            Err(RegionError::Teardown {
                name: self.region.clone(),
                reason: format!("shmdt failed: {}", Errno::last()),
            })
        }
    }
}

/// Remove a leaked segment by key. `Ok(false)` if absent.
pub(crate) fn remove_store_by_key(region: &str, key: libc::key_t) -> RegionResult<bool> {
    // SAFETY: plain syscall wrapper.
    let id = unsafe { libc::shmget(key, 0, OBJECT_MODE) };
    if id < 0 {
        return match Errno::last() {
            Errno::ENOENT => Ok(false),
            e => Err(RegionError::Teardown {
                name: region.to_string(),
                reason: format!("shmget failed: {}", e),
            }),
        };
    }
    if rmid_segment(id) == 0 {
        Ok(true)
    } else {
        Err(RegionError::Teardown {
            name: region.to_string(),
            reason: format!("shmctl(IPC_RMID) failed: {}", Errno::last()),
        })
    }
}

/// Remove a leaked semaphore set by key. `Ok(false)` if absent.
pub(crate) fn remove_semaphore_by_key(region: &str, key: libc::key_t) -> RegionResult<bool> {
    // SAFETY: plain syscall wrapper.
    let id = unsafe { libc::semget(key, 0, OBJECT_MODE) };
    if id < 0 {
        return match Errno::last() {
            Errno::ENOENT => Ok(false),
            e => Err(RegionError::Teardown {
                name: region.to_string(),
                reason: format!("semget failed: {}", e),
            }),
        };
    }
    // SAFETY: IPC_RMID takes no fourth argument.
    if unsafe { libc::semctl(id, 0, libc::IPC_RMID) } == 0 {
        Ok(true)
    } else {
        Err(RegionError::Teardown {
            name: region.to_string(),
            reason: format!("semctl(IPC_RMID) failed: {}", Errno::last()),
        })
    }
}

/// One-element System V semaphore set.
///
/// Operations do not use SEM_UNDO: a holder that dies keeps the lock held,
/// same as the POSIX backend.
pub(crate) struct SysvSemaphore {
    region: String,
    id: libc::c_int,
}

impl SysvSemaphore {
    /// Create with value 1 (released).
    pub(crate) fn create(region: &str, key: libc::key_t) -> RegionResult<Self> {
        // SAFETY: plain syscall wrapper.
        let id = unsafe { libc::semget(key, 1, libc::IPC_CREAT | libc::IPC_EXCL | OBJECT_MODE) };
        if id < 0 {
            return Err(RegionError::Semaphore {
                name: region.to_string(),
                operation: "create",
                source: Errno::last(),
            });
        }

        // New sets start at 0 on Linux; release it explicitly.
        // SAFETY: SETVAL takes an int as the fourth argument.
        if unsafe { libc::semctl(id, 0, libc::SETVAL, 1 as libc::c_int) } < 0 {
            let errno = Errno::last();
            // SAFETY: IPC_RMID takes no fourth argument.
            unsafe { libc::semctl(id, 0, libc::IPC_RMID) };
            return Err(RegionError::Semaphore {
                name: region.to_string(),
                operation: "create",
                source: errno,
            });
        }

        Ok(Self {
            region: region.to_string(),
            id,
        })
    }

    pub(crate) fn open(region: &str, key: libc::key_t) -> RegionResult<Self> {
        // SAFETY: plain syscall wrapper.
        let id = unsafe { libc::semget(key, 1, OBJECT_MODE) };
        if id < 0 {
            let errno = Errno::last();
            return Err(if errno == Errno::ENOENT {
                not_found(region, format!("no semaphore with key {:#010x}", key))
            } else {
                RegionError::Semaphore {
                    name: region.to_string(),
                    operation: "open",
                    source: errno,
                }
            });
        }
        Ok(Self {
            region: region.to_string(),
            id,
        })
    }

    fn op(&self, delta: libc::c_short, flags: libc::c_short) -> Result<(), Errno> {
        let mut sb = libc::sembuf {
            sem_num: 0,
            sem_op: delta,
            sem_flg: flags,
        };
        // SAFETY: sb is a valid single-element operation array.
        if unsafe { libc::semop(self.id, &mut sb, 1) } == 0 {
            Ok(())
        } else {
            Err(Errno::last())
        }
    }

    fn error(&self, operation: &'static str, errno: Errno) -> RegionError {
        match errno {
            // Set removed under us by the creator.
            Errno::EIDRM | Errno::EINVAL => not_found(&self.region, "semaphore was removed"),
            e => RegionError::Semaphore {
                name: self.region.clone(),
                operation,
                source: e,
            },
        }
    }
}

impl RegionLock for SysvSemaphore {
    fn wait(&self) -> RegionResult<()> {
        loop {
            match self.op(-1, 0) {
                Ok(()) => return Ok(()),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(self.error("wait", e)),
            }
        }
    }

    fn wait_timeout(&self, timeout: Duration) -> RegionResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.op(-1, libc::IPC_NOWAIT as libc::c_short) {
                Ok(()) => return Ok(true),
                Err(Errno::EAGAIN) | Err(Errno::EINTR) => {
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                    std::thread::sleep(TIMED_WAIT_POLL);
                }
                Err(e) => return Err(self.error("timedwait", e)),
            }
        }
    }

    fn post(&self) -> RegionResult<()> {
        self.op(1, 0).map_err(|e| self.error("post", e))
    }

    fn remove(&self) -> RegionResult<()> {
        // SAFETY: IPC_RMID takes no fourth argument.
        if unsafe { libc::semctl(self.id, 0, libc::IPC_RMID) } == 0 {
            return Ok(());
        }
        match Errno::last() {
            Errno::EIDRM | Errno::EINVAL => {
                Err(not_found(&self.region, "semaphore already removed"))
            }
            e => Err(RegionError::Teardown {
                name: self.region.clone(),
                reason: format!("semctl(IPC_RMID) failed: {}", e),
            }),
        }
    }

    fn close(self: Box<Self>) -> RegionResult<()> {
        // System V semaphores have no per-process handle to release.
        Ok(())
    }
}
