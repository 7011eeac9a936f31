//! Task cells and handles
//!
//! A task is a `Future<Output = ()>` heap-allocated next to a small header
//! holding a two-entry vtable, a done flag and the engine the task last ran
//! on. [`TaskHandle`] is the opaque resumable token the rest of the runtime
//! passes around: `Copy`, pointer-sized, with `resume` / `done` / `destroy`.
//!
//! The waker handed to the future is the task pointer itself; `wake()`
//! re-submits the handle to the recorded engine. Waker `clone` is a plain
//! pointer copy: every record that stores a handle (an `io_info`, a waiter
//! node) must outlive the operation that resumes it, so the task outlives
//! every waker derived from it.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use crate::engine::Engine;
use crate::meta;

#[repr(C)]
pub(crate) struct Header {
    vtable: &'static TaskVTable,
    /// Set once the future returns `Ready`.
    done: AtomicBool,
    /// Engine the task last ran on; wake target.
    engine: AtomicPtr<Engine>,
}

struct TaskVTable {
    poll: unsafe fn(NonNull<Header>),
    drop: unsafe fn(NonNull<Header>),
}

/// Header followed by the future, so a header pointer is also a cell
/// pointer.
#[repr(C)]
struct TaskCell<F> {
    header: Header,
    future: F,
}

struct VTableOf<F>(PhantomData<F>);

impl<F: Future<Output = ()>> VTableOf<F> {
    const TABLE: TaskVTable = TaskVTable {
        poll: poll_task::<F>,
        drop: drop_task::<F>,
    };
}

unsafe fn poll_task<F: Future<Output = ()>>(ptr: NonNull<Header>) {
    let cell = ptr.cast::<TaskCell<F>>().as_ptr();

    // Record the executing engine so wakes land back on it.
    (*cell)
        .header
        .engine
        .store(meta::local_engine_ptr() as *mut Engine, Ordering::Release);

    let raw = RawWaker::new(ptr.as_ptr() as *const (), &WAKER_VTABLE);
    let waker = Waker::from_raw(raw);
    let mut cx = Context::from_waker(&waker);

    // The future never moves out of its cell.
    let future = Pin::new_unchecked(&mut (*cell).future);
    if let Poll::Ready(()) = future.poll(&mut cx) {
        (*cell).header.done.store(true, Ordering::Release);
    }
}

unsafe fn drop_task<F>(ptr: NonNull<Header>) {
    drop(Box::from_raw(ptr.cast::<TaskCell<F>>().as_ptr()));
}

unsafe fn waker_clone(data: *const ()) -> RawWaker {
    RawWaker::new(data, &WAKER_VTABLE)
}

unsafe fn waker_wake(data: *const ()) {
    TaskHandle::from_data(data).schedule();
}

unsafe fn waker_wake_by_ref(data: *const ()) {
    TaskHandle::from_data(data).schedule();
}

unsafe fn waker_drop(_data: *const ()) {}

static WAKER_VTABLE: RawWakerVTable =
    RawWakerVTable::new(waker_clone, waker_wake, waker_wake_by_ref, waker_drop);

/// Opaque resumable token for one suspended task.
///
/// Plain pointer semantics: copying a handle does not affect the task's
/// lifetime. Whoever resumes the task to completion (or the engine on
/// deinit, for detached tasks) destroys it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    ptr: NonNull<Header>,
}

// Safety: a handle is just a pointer; the task cell's fields that cross
// threads (done flag, engine slot) are atomics, and the future itself is
// required to be Send at creation.
unsafe impl Send for TaskHandle {}

impl TaskHandle {
    #[inline]
    fn header(&self) -> &Header {
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn from_data(data: *const ()) -> TaskHandle {
        TaskHandle {
            ptr: NonNull::new_unchecked(data as *mut Header),
        }
    }

    /// Recover the handle of the task a waker belongs to.
    ///
    /// # Safety
    ///
    /// The waker must originate from this runtime (it is the one passed to a
    /// task future's `poll`). Wakers from foreign executors carry arbitrary
    /// data pointers.
    #[inline]
    pub unsafe fn from_waker(waker: &Waker) -> TaskHandle {
        Self::from_data(waker.data())
    }

    /// Run the task until its next suspension point or completion.
    pub fn resume(self) {
        debug_assert!(!self.done(), "resumed a completed task");
        unsafe { (self.header().vtable.poll)(self.ptr) }
    }

    /// Whether the task has run to completion.
    pub fn done(self) -> bool {
        self.header().done.load(Ordering::Acquire)
    }

    /// Free the task cell. The handle (and every copy of it) is dangling
    /// afterwards.
    pub fn destroy(self) {
        unsafe { (self.header().vtable.drop)(self.ptr) }
    }

    /// Waker path: re-submit to the engine the task last ran on.
    pub(crate) fn schedule(self) {
        let engine = self.header().engine.load(Ordering::Acquire);
        if engine.is_null() {
            tracing::error!("task woken before running on any engine, wake dropped");
            return;
        }
        unsafe { (*engine).submit_task(self) }
    }
}

/// Scoped owner of a task cell.
///
/// Dropping a `Task` frees the cell unless ownership was relinquished with
/// [`detach`](Task::detach). A task submitted by reference must not run to
/// completion while still owned here, because the executing engine destroys
/// completed tasks.
pub struct Task {
    raw: TaskHandle,
    detached: bool,
}

impl Task {
    pub fn new<F>(future: F) -> Task
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let cell = Box::new(TaskCell {
            header: Header {
                vtable: &VTableOf::<F>::TABLE,
                done: AtomicBool::new(false),
                engine: AtomicPtr::new(ptr::null_mut()),
            },
            future,
        });
        let ptr = Box::into_raw(cell) as *mut Header;
        Task {
            raw: TaskHandle {
                ptr: unsafe { NonNull::new_unchecked(ptr) },
            },
            detached: false,
        }
    }

    /// The task's resumable handle. Does not transfer ownership.
    pub fn handle(&self) -> TaskHandle {
        self.raw
    }

    /// Relinquish ownership: whoever resumes the task to completion (or the
    /// engine holding it at deinit) destroys the cell.
    pub fn detach(mut self) -> TaskHandle {
        self.detached = true;
        self.raw
    }
}

impl Drop for Task {
    fn drop(&mut self) {
        if !self.detached {
            self.raw.destroy();
        }
    }
}
