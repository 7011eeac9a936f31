//! Concrete I/O awaiters
//!
//! Every op follows the same submission contract: on first poll, record the
//! task handle in the op's `IoInfo`, build the SQE with the record as
//! user_data, hand it to the local engine, and suspend. The engine's CQE
//! drain runs [`resume_callback`], which stores the result and reschedules
//! the task; the next poll returns it.
//!
//! These futures may only be awaited inside tasks running on a ringloom
//! engine: they recover their handle from the runtime's waker and submit
//! to the thread-local engine.
//!
//! `read` and `write` try the ring's registered-file pool first and fall
//! back to the plain fd path when it is exhausted.

use std::future::Future;
use std::io;
use std::marker::PhantomPinned;
use std::mem;
use std::os::fd::RawFd;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use io_uring::{opcode, types};

use crate::engine::Engine;
use crate::io::info::{resume_callback, IoInfo};
use crate::meta;
use crate::task::TaskHandle;
use crate::uring::FixedFdSlot;

enum OpState {
    Idle,
    Submitted,
}

fn map_result(res: i32) -> io::Result<i32> {
    if res < 0 {
        Err(io::Error::from_raw_os_error(-res))
    } else {
        Ok(res)
    }
}

/// Borrow a registered-file slot and point it at `fd`, or None when the
/// pool is exhausted or the kernel update fails.
fn acquire_fixed(engine: &Engine, fd: RawFd) -> Option<FixedFdSlot> {
    // Safety: ops run on the engine's owning thread
    let uring = unsafe { engine.uring() };
    let slot = uring.get_fixed_fd()?;
    match uring.update_register_fixed_fd(slot.idx, fd) {
        Ok(()) => Some(slot),
        Err(e) => {
            tracing::warn!("fixed-fd update failed, using plain fd: {}", e);
            uring.back_fixed_fd(slot);
            None
        }
    }
}

fn release_fixed(slot: FixedFdSlot) {
    let engine = meta::local_engine_ptr();
    if engine.is_null() {
        tracing::warn!("fixed-fd slot dropped off its worker thread, slot leaked");
        return;
    }
    // Safety: same thread that borrowed the slot
    unsafe { (*engine).uring().back_fixed_fd(slot) };
}

/// Submit a no-op and wait for its completion. Returns the raw CQE result.
pub fn nop() -> Nop {
    Nop {
        info: IoInfo::new(resume_callback),
        state: OpState::Idle,
        _pin: PhantomPinned,
    }
}

pub struct Nop {
    info: IoInfo,
    state: OpState,
    _pin: PhantomPinned,
}

impl Future for Nop {
    type Output = i32;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<i32> {
        // Safety: the frame is pinned; the info record never moves
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            OpState::Idle => {
                this.info.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                let sqe = opcode::Nop::new().build().user_data(this.info.user_data());
                unsafe { meta::local_engine() }.submit_io(sqe);
                this.state = OpState::Submitted;
                Poll::Pending
            }
            OpState::Submitted => {
                if this.info.completed {
                    Poll::Ready(this.info.result)
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

/// Read from `fd` at the current file position into `buf`.
pub fn read(fd: RawFd, buf: &mut [u8]) -> Read<'_> {
    Read {
        fd,
        buf,
        info: IoInfo::new(resume_callback),
        fixed: None,
        state: OpState::Idle,
        _pin: PhantomPinned,
    }
}

pub struct Read<'a> {
    fd: RawFd,
    buf: &'a mut [u8],
    info: IoInfo,
    fixed: Option<FixedFdSlot>,
    state: OpState,
    _pin: PhantomPinned,
}

impl Future for Read<'_> {
    type Output = io::Result<i32>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<i32>> {
        // Safety: the frame is pinned; the info record never moves
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            OpState::Idle => {
                this.info.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                let engine = unsafe { meta::local_engine() };

                let ptr = this.buf.as_mut_ptr();
                let len = this.buf.len() as u32;
                let op = match acquire_fixed(engine, this.fd) {
                    Some(slot) => {
                        let op = opcode::Read::new(types::Fixed(slot.idx), ptr, len);
                        this.fixed = Some(slot);
                        op
                    }
                    None => opcode::Read::new(types::Fd(this.fd), ptr, len),
                };
                let sqe = op
                    .offset(u64::MAX) // current file position
                    .build()
                    .user_data(this.info.user_data());
                engine.submit_io(sqe);
                this.state = OpState::Submitted;
                Poll::Pending
            }
            OpState::Submitted => {
                if this.info.completed {
                    Poll::Ready(map_result(this.info.result))
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

impl Drop for Read<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.fixed.take() {
            release_fixed(slot);
        }
    }
}

/// Write `buf` to `fd` at the current file position.
pub fn write(fd: RawFd, buf: &[u8]) -> Write<'_> {
    Write {
        fd,
        buf,
        info: IoInfo::new(resume_callback),
        fixed: None,
        state: OpState::Idle,
        _pin: PhantomPinned,
    }
}

pub struct Write<'a> {
    fd: RawFd,
    buf: &'a [u8],
    info: IoInfo,
    fixed: Option<FixedFdSlot>,
    state: OpState,
    _pin: PhantomPinned,
}

impl Future for Write<'_> {
    type Output = io::Result<i32>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<i32>> {
        // Safety: the frame is pinned; the info record never moves
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            OpState::Idle => {
                this.info.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                let engine = unsafe { meta::local_engine() };

                let ptr = this.buf.as_ptr();
                let len = this.buf.len() as u32;
                let op = match acquire_fixed(engine, this.fd) {
                    Some(slot) => {
                        let op = opcode::Write::new(types::Fixed(slot.idx), ptr, len);
                        this.fixed = Some(slot);
                        op
                    }
                    None => opcode::Write::new(types::Fd(this.fd), ptr, len),
                };
                let sqe = op
                    .offset(u64::MAX)
                    .build()
                    .user_data(this.info.user_data());
                engine.submit_io(sqe);
                this.state = OpState::Submitted;
                Poll::Pending
            }
            OpState::Submitted => {
                if this.info.completed {
                    Poll::Ready(map_result(this.info.result))
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

impl Drop for Write<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.fixed.take() {
            release_fixed(slot);
        }
    }
}

/// Accept one connection on the listening socket `fd`. Resolves to the
/// accepted fd.
pub fn accept(fd: RawFd) -> Accept {
    Accept {
        fd,
        addr: unsafe { mem::zeroed() },
        addr_len: mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t,
        info: IoInfo::new(resume_callback),
        state: OpState::Idle,
        _pin: PhantomPinned,
    }
}

pub struct Accept {
    fd: RawFd,
    addr: libc::sockaddr_storage,
    addr_len: libc::socklen_t,
    info: IoInfo,
    state: OpState,
    _pin: PhantomPinned,
}

impl Future for Accept {
    type Output = io::Result<RawFd>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<RawFd>> {
        // Safety: the frame is pinned; addr and info never move
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            OpState::Idle => {
                this.info.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                let sqe = opcode::Accept::new(
                    types::Fd(this.fd),
                    &mut this.addr as *mut libc::sockaddr_storage as *mut libc::sockaddr,
                    &mut this.addr_len as *mut libc::socklen_t,
                )
                .build()
                .user_data(this.info.user_data());
                unsafe { meta::local_engine() }.submit_io(sqe);
                this.state = OpState::Submitted;
                Poll::Pending
            }
            OpState::Submitted => {
                if this.info.completed {
                    Poll::Ready(map_result(this.info.result))
                } else {
                    Poll::Pending
                }
            }
        }
    }
}

/// Suspend for at least `dur`.
pub fn timeout(dur: Duration) -> Timeout {
    Timeout {
        ts: types::Timespec::new()
            .sec(dur.as_secs())
            .nsec(dur.subsec_nanos()),
        info: IoInfo::new(resume_callback),
        state: OpState::Idle,
        _pin: PhantomPinned,
    }
}

pub struct Timeout {
    ts: types::Timespec,
    info: IoInfo,
    state: OpState,
    _pin: PhantomPinned,
}

impl Future for Timeout {
    type Output = io::Result<()>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // Safety: the frame is pinned; ts and info never move
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            OpState::Idle => {
                this.info.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                let sqe = opcode::Timeout::new(&this.ts as *const types::Timespec)
                    .build()
                    .user_data(this.info.user_data());
                unsafe { meta::local_engine() }.submit_io(sqe);
                this.state = OpState::Submitted;
                Poll::Pending
            }
            OpState::Submitted => {
                if this.info.completed {
                    // a timer expiring on schedule completes with -ETIME
                    let res = this.info.result;
                    if res == 0 || res == -libc::ETIME {
                        Poll::Ready(Ok(()))
                    } else {
                        Poll::Ready(Err(io::Error::from_raw_os_error(-res)))
                    }
                } else {
                    Poll::Pending
                }
            }
        }
    }
}
