//! One-shot event
//!
//! A single atomic pointer encodes the whole state: null = unset with no
//! waiters, a sentinel = set, anything else = head of the waiter stack.
//! `set()` swaps in the sentinel and resumes every popped waiter on its
//! origin context; waiters that observe the sentinel never suspend.
//! Exactly one signaled transition.

use std::future::Future;
use std::marker::PhantomPinned;
use std::pin::Pin;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::task::Poll;

use crate::context::Context;
use crate::meta;
use crate::task::TaskHandle;

pub struct Event {
    /// null | SET sentinel | waiter stack head
    state: AtomicPtr<Waiter>,
}

struct Waiter {
    next: *mut Waiter,
    ctx: *const Context,
    handle: Option<TaskHandle>,
    signaled: AtomicBool,
}

/// Sentinel for the signaled state. Never dereferenced.
#[inline]
fn set_marker() -> *mut Waiter {
    1usize as *mut Waiter
}

/// Resume one popped waiter on its origin context. See
/// [`crate::sync::wait_group`] for the read-before-signal rule.
unsafe fn resume_waiter(node: *mut Waiter) {
    let ctx = &*(*node).ctx;
    let handle = (*node).handle.expect("published waiter without a handle");
    (*node).signaled.store(true, Ordering::Release);
    ctx.submit_handle(handle);
}

impl Event {
    pub fn new() -> Self {
        Self {
            state: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Pre-armed constructor; a set event resumes waiters immediately.
    pub fn with_state(set: bool) -> Self {
        let ev = Self::new();
        if set {
            ev.state.store(set_marker(), Ordering::Relaxed);
        }
        ev
    }

    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == set_marker()
    }

    /// Signal the event. The first call resumes every queued waiter;
    /// subsequent calls are no-ops.
    pub fn set(&self) {
        let old = self.state.swap(set_marker(), Ordering::AcqRel);
        if old == set_marker() {
            return;
        }
        let mut node = old;
        while !node.is_null() {
            let next = unsafe { (*node).next };
            unsafe { resume_waiter(node) };
            node = next;
        }
    }

    pub fn wait(&self) -> EventWait<'_> {
        EventWait {
            ev: self,
            waiter: Waiter {
                next: ptr::null_mut(),
                ctx: ptr::null(),
                handle: None,
                signaled: AtomicBool::new(false),
            },
            state: WaitState::Init,
            _pin: PhantomPinned,
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

enum WaitState {
    Init,
    Published,
    Done,
}

pub struct EventWait<'a> {
    ev: &'a Event,
    waiter: Waiter,
    state: WaitState,
    _pin: PhantomPinned,
}

// Safety: same record discipline as the wait-group awaiter.
unsafe impl Send for EventWait<'_> {}

impl Future for EventWait<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> Poll<()> {
        // Safety: the frame is pinned; the published record never moves
        let this = unsafe { self.get_unchecked_mut() };
        match this.state {
            WaitState::Init => {
                // already signaled: no suspension, no wait accounting
                if this.ev.state.load(Ordering::Acquire) == set_marker() {
                    this.state = WaitState::Done;
                    return Poll::Ready(());
                }

                let ctx_ptr = meta::local_context_ptr();
                assert!(!ctx_ptr.is_null(), "event awaited outside a worker context");
                let ctx = unsafe { &*ctx_ptr };

                this.waiter.ctx = ctx_ptr;
                this.waiter.handle = Some(unsafe { TaskHandle::from_waker(cx.waker()) });
                ctx.register_wait(1);

                let me = &mut this.waiter as *mut Waiter;
                loop {
                    let head = this.ev.state.load(Ordering::Acquire);
                    if head == set_marker() {
                        // set() won the race before we published
                        ctx.unregister_wait(1);
                        this.state = WaitState::Done;
                        return Poll::Ready(());
                    }
                    this.waiter.next = head;
                    if this
                        .ev
                        .state
                        .compare_exchange_weak(head, me, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
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

#[cfg(test)]
mod tests {
    use super::*;
    use ringloom_core::Config;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn standalone_ctx() -> Arc<Context> {
        Arc::new(Context::new(&Config::new()).unwrap())
    }

    #[test]
    fn test_wait_on_set_event_is_immediate() {
        let ctx = standalone_ctx();
        let ev = Arc::new(Event::with_state(true));
        let hits = Arc::new(AtomicUsize::new(0));

        assert!(ev.is_set());
        let hits2 = hits.clone();
        ctx.spawn(async move {
            ev.wait().await;
            hits2.fetch_add(1, Ordering::SeqCst);
        });

        ctx.start();
        ctx.join();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_resumes_all_waiters() {
        let ctx = standalone_ctx();
        let ev = Arc::new(Event::new());
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let ev = ev.clone();
            let hits = hits.clone();
            ctx.spawn(async move {
                ev.wait().await;
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        let ev2 = ev.clone();
        ctx.spawn(async move {
            ev2.set();
        });

        ctx.start();
        ctx.join();
        assert_eq!(hits.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn test_cross_thread_set() {
        let ctx = standalone_ctx();
        let ev = Arc::new(Event::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let ev1 = ev.clone();
        let hits1 = hits.clone();
        ctx.spawn(async move {
            ev1.wait().await;
            hits1.fetch_add(1, Ordering::SeqCst);
        });
        ctx.start();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        ev.set();

        ctx.join();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(ev.is_set());
    }

    #[test]
    fn test_set_twice_is_one_transition() {
        let ev = Event::new();
        ev.set();
        assert!(ev.is_set());
        ev.set();
        assert!(ev.is_set());
    }
}
