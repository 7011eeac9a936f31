//! io_uring proxy
//!
//! Wraps one `IoUring` instance plus the engine's eventfd, registered with
//! the ring so the kernel bumps the counter for every posted CQE. A single
//! blocking read of the eventfd both unparks the engine and classifies the
//! wake cause through the counter's bit layout (see [`crate::engine`]).
//!
//! Also owns the registered-file slot pool: a bounded table of fixed-fd
//! slots that awaiters borrow, re-point at their fd, and return.

use std::io;
use std::os::fd::RawFd;

use io_uring::{squeue, IoUring};
use ringloom_core::error::RingError;

/// A borrowed registered-file slot.
#[derive(Debug)]
pub struct FixedFdSlot {
    pub idx: u32,
}

pub struct UringProxy {
    ring: IoUring,
    event_fd: RawFd,
    fixed_free: Vec<u32>,
}

impl UringProxy {
    /// Build the ring, register the eventfd, and set up the sparse
    /// registered-file table.
    pub fn new(entries: u32, event_fd: RawFd, fixed_fd_slots: u32) -> Result<Self, RingError> {
        let ring = IoUring::builder()
            .build(entries)
            .map_err(|e| RingError::Setup(e.raw_os_error().unwrap_or(-1)))?;

        ring.submitter()
            .register_eventfd(event_fd)
            .map_err(|e| RingError::Register(e.raw_os_error().unwrap_or(-1)))?;

        if fixed_fd_slots > 0 {
            ring.submitter()
                .register_files_sparse(fixed_fd_slots)
                .map_err(|e| RingError::Register(e.raw_os_error().unwrap_or(-1)))?;
        }

        Ok(Self {
            ring,
            event_fd,
            // Hand slots out lowest-index first
            fixed_free: (0..fixed_fd_slots).rev().collect(),
        })
    }

    /// Queue one SQE. Returns false when the submission queue is full;
    /// never blocks.
    pub fn push_sqe(&mut self, sqe: &squeue::Entry) -> bool {
        unsafe { self.ring.submission().push(sqe).is_ok() }
    }

    /// Commit all queued SQEs to the kernel.
    pub fn submit(&self) -> io::Result<usize> {
        self.ring.submit()
    }

    /// Block until the eventfd is readable and return its drained counter.
    ///
    /// The counter accumulates concurrent writes (task wakes, explicit I/O
    /// wakes, per-CQE kernel bumps); the caller classifies the sum with the
    /// engine's bit masks.
    pub fn wait_eventfd(&mut self) -> u64 {
        let mut val: u64 = 0;
        loop {
            let ret = unsafe {
                libc::read(
                    self.event_fd,
                    &mut val as *mut u64 as *mut libc::c_void,
                    std::mem::size_of::<u64>(),
                )
            };
            if ret == std::mem::size_of::<u64>() as isize {
                return val;
            }
            let errno = unsafe { *libc::__errno_location() };
            if errno == libc::EINTR {
                continue;
            }
            tracing::error!("eventfd read failed: errno {}", errno);
            return 0;
        }
    }

    /// Drain up to `max` completions into `out` as `(user_data, result)`
    /// pairs, advancing past exactly what was drained.
    pub fn reap_completions(&mut self, max: usize, out: &mut Vec<(u64, i32)>) -> usize {
        out.clear();
        if max == 0 {
            return 0;
        }
        let mut cq = self.ring.completion();
        while out.len() < max {
            match cq.next() {
                Some(cqe) => out.push((cqe.user_data(), cqe.result())),
                None => break,
            }
        }
        // consumed entries are released when the queue handle drops
        out.len()
    }

    /// Borrow a registered-file slot, or None when the pool is exhausted.
    pub fn get_fixed_fd(&mut self) -> Option<FixedFdSlot> {
        self.fixed_free.pop().map(|idx| FixedFdSlot { idx })
    }

    /// Return a borrowed slot to the pool.
    pub fn back_fixed_fd(&mut self, slot: FixedFdSlot) {
        self.fixed_free.push(slot.idx);
    }

    /// Re-point a registered-file slot at a newly assigned fd.
    pub fn update_register_fixed_fd(&mut self, idx: u32, fd: RawFd) -> io::Result<()> {
        self.ring.submitter().register_files_update(idx, &[fd])?;
        Ok(())
    }
}

/// Create the accumulating eventfd an engine shares with its ring.
///
/// Blocking reads, no semaphore semantics: concurrent writes sum into one
/// counter drained by a single read.
pub(crate) fn create_eventfd() -> Result<RawFd, RingError> {
    let fd = unsafe { libc::eventfd(0, libc::EFD_CLOEXEC) };
    if fd < 0 {
        let errno = unsafe { *libc::__errno_location() };
        return Err(RingError::EventFd(errno));
    }
    Ok(fd)
}

pub(crate) fn write_eventfd(fd: RawFd, val: u64) {
    let ret = unsafe {
        libc::write(
            fd,
            &val as *const u64 as *const libc::c_void,
            std::mem::size_of::<u64>(),
        )
    };
    if ret < 0 {
        let errno = unsafe { *libc::__errno_location() };
        // EAGAIN means the counter is near overflow: a wake is already
        // pending, nothing is lost.
        if errno != libc::EAGAIN {
            tracing::error!("eventfd write failed: errno {}", errno);
        }
    }
}
