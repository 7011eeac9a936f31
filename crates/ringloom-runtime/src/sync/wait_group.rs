//! Wait group
//!
//! An atomic counter plus a lock-free stack of waiter records. `add` and
//! `done` are callable from any thread; waiters suspend inside runtime
//! tasks and are resumed on their origin contexts when the count reaches
//! zero.
//!
//! The waiter records live in the suspended futures' frames; the group must
//! not be dropped until every `done` has happened and every waiter resumed.

use std::future::Future;
use std::marker::PhantomPinned;
use std::pin::Pin;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicPtr, Ordering};
use std::task::Poll;

use crate::context::Context;
use crate::meta;
use crate::task::TaskHandle;

pub struct WaitGroup {
    count: AtomicI32,
    /// Head of the waiter stack.
    head: AtomicPtr<Waiter>,
}

struct Waiter {
    next: *mut Waiter,
    ctx: *const Context,
    handle: Option<TaskHandle>,
    /// Set by the drainer before the handle is re-submitted.
    signaled: AtomicBool,
}

impl Waiter {
    fn new() -> Self {
        Self {
            next: ptr::null_mut(),
            ctx: ptr::null(),
            handle: None,
            signaled: AtomicBool::new(false),
        }
    }
}

/// Resume one popped waiter on its origin context.
///
/// # Safety
///
/// `node` must be a published waiter record this caller exclusively popped.
/// Read everything out of the record before storing `signaled`: once the
/// resubmitted task runs, the frame may be gone.
unsafe fn resume_waiter(node: *mut Waiter) {
    let ctx = &*(*node).ctx;
    let handle = (*node).handle.expect("published waiter without a handle");
    (*node).signaled.store(true, Ordering::Release);
    ctx.submit_handle(handle);
}

impl WaitGroup {
    pub fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    pub fn with_count(count: i32) -> Self {
        let wg = Self::new();
        wg.count.store(count, Ordering::Relaxed);
        wg
    }

    pub fn add(&self, count: i32) {
        self.count.fetch_add(count, Ordering::AcqRel);
    }

    /// Decrement the count; the transition to zero drains the waiter stack
    /// and resumes every record on its origin context.
    pub fn done(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            let mut node = self.head.swap(ptr::null_mut(), Ordering::AcqRel);
            while !node.is_null() {
                let next = unsafe { (*node).next };
                unsafe { resume_waiter(node) };
                node = next;
            }
        }
    }

    /// Awaiter bound to this group and the awaiting task's context.
    pub fn wait(&self) -> WaitGroupWait<'_> {
        WaitGroupWait {
            wg: self,
            waiter: Waiter::new(),
            state: WaitState::Init,
            _pin: PhantomPinned,
        }
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        Self::new()
    }
}

enum WaitState {
    Init,
    Published,
    Done,
}

pub struct WaitGroupWait<'a> {
    wg: &'a WaitGroup,
    waiter: Waiter,
    state: WaitState,
    _pin: PhantomPinned,
}

// Safety: the record is touched only by the owning task's thread until it
// is published, and afterwards only by whoever pops it, under the ordering
// the head/signaled atomics establish.
unsafe impl Send for WaitGroupWait<'_> {}

impl Future for WaitGroupWait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<()> {
        // Safety: the frame is pinned; the published record never moves
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            WaitState::Init => {
                let ctx_ptr = meta::local_context_ptr();
                assert!(
                    !ctx_ptr.is_null(),
                    "wait_group awaited outside a worker context"
                );
                let ctx = unsafe { &*ctx_ptr };

                this.waiter.ctx = ctx_ptr;
                this.waiter.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                ctx.register_wait(1);

                let me = &mut this.waiter as *mut Waiter;
                loop {
                    if this.wg.count.load(Ordering::Acquire) == 0 {
                        ctx.unregister_wait(1);
                        this.state = WaitState::Done;
                        return Poll::Ready(());
                    }
                    let head = this.wg.head.load(Ordering::Acquire);
                    this.waiter.next = head;
                    if this
                        .wg
                        .head
                        .compare_exchange_weak(head, me, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        // The last done() may have drained between the check
                        // above and the publish. Re-read the count; on zero,
                        // claim the stack back.
                        if this.wg.count.load(Ordering::Acquire) == 0 {
                            let list = this.wg.head.swap(ptr::null_mut(), Ordering::AcqRel);
                            if !list.is_null() {
                                // rescue drain: resume everyone else and
                                // don't suspend ourselves
                                let mut node = list;
                                while !node.is_null() {
                                    let next = unsafe { (*node).next };
                                    if node != me {
                                        unsafe { resume_waiter(node) };
                                    }
                                    node = next;
                                }
                                ctx.unregister_wait(1);
                                this.state = WaitState::Done;
                                return Poll::Ready(());
                            }
                            // a concurrent drain owns our record and will
                            // resume us
                        }
                        this.state = WaitState::Published;
                        return Poll::Pending;
                    }
                }
            }
            WaitState::Published => {
                if this.waiter.signaled.load(Ordering::Acquire) {
                    let ctx = unsafe { &*this.waiter.ctx };
                    ctx.unregister_wait(1);
                    this.state = WaitState::Done;
                    Poll::Ready(())
                } else {
                    Poll::Pending
                }
            }
            WaitState::Done => Poll::Ready(()),
        }
    }
}
