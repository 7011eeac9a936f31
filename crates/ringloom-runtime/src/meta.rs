//! Thread-local runtime slots and process-wide id generators
//!
//! Each worker thread publishes its `(context, engine)` pair here for the
//! duration of its run; outside a worker both slots are null. Code running
//! on a worker uses these slots to find its owners without threading them
//! through every call.

use std::cell::Cell;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::context::Context;
use crate::engine::Engine;

thread_local! {
    /// Context owning the current worker thread
    static LOCAL_CONTEXT: Cell<*const Context> = const { Cell::new(ptr::null()) };

    /// Engine owned by the current worker thread
    static LOCAL_ENGINE: Cell<*const Engine> = const { Cell::new(ptr::null()) };
}

static CONTEXT_ID: AtomicU32 = AtomicU32::new(0);
static ENGINE_ID: AtomicU32 = AtomicU32::new(0);

pub(crate) fn next_context_id() -> u32 {
    CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
}

pub(crate) fn next_engine_id() -> u32 {
    ENGINE_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
pub(crate) fn set_local_context(ctx: *const Context) {
    LOCAL_CONTEXT.with(|cell| cell.set(ctx));
}

#[inline]
pub(crate) fn clear_local_context() {
    LOCAL_CONTEXT.with(|cell| cell.set(ptr::null()));
}

#[inline]
pub(crate) fn set_local_engine(egn: *const Engine) {
    LOCAL_ENGINE.with(|cell| cell.set(egn));
}

#[inline]
pub(crate) fn clear_local_engine() {
    LOCAL_ENGINE.with(|cell| cell.set(ptr::null()));
}

/// Check if the calling thread is a worker thread (has a published context).
#[inline]
pub fn in_worker() -> bool {
    LOCAL_CONTEXT.with(|cell| !cell.get().is_null())
}

#[inline]
pub(crate) fn local_context_ptr() -> *const Context {
    LOCAL_CONTEXT.with(|cell| cell.get())
}

#[inline]
pub(crate) fn local_engine_ptr() -> *const Engine {
    LOCAL_ENGINE.with(|cell| cell.get())
}

/// Engine bound to the calling thread.
///
/// # Safety
///
/// Only valid on a thread whose engine slot is published (a worker between
/// `engine.init()` and `engine.deinit()`). Calling it anywhere else is
/// undefined; a debug assertion catches the null slot.
#[inline]
pub(crate) unsafe fn local_engine<'a>() -> &'a Engine {
    let egn = local_engine_ptr();
    debug_assert!(!egn.is_null(), "no engine bound to this thread");
    &*egn
}
