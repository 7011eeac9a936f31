//! Dispatch policies
//!
//! The scheduler picks a target context for every submission through a
//! `Dispatch` implementation. Swapping policies is a one-line change at
//! scheduler construction.

use std::sync::atomic::{AtomicUsize, Ordering};

use ringloom_core::DispatchStrategy;

pub trait Dispatch: Send + Sync {
    /// Index of the context that receives the next task.
    fn dispatch(&self) -> usize;
}

/// Atomic counter modulo context count.
pub struct RoundRobin {
    ctx_cnt: usize,
    cur: AtomicUsize,
}

impl RoundRobin {
    pub fn new(ctx_cnt: usize) -> Self {
        Self {
            ctx_cnt,
            cur: AtomicUsize::new(0),
        }
    }
}

impl Dispatch for RoundRobin {
    fn dispatch(&self) -> usize {
        self.cur.fetch_add(1, Ordering::AcqRel) % self.ctx_cnt
    }
}

/// Everything lands on context 0. Stand-in for an embedder-supplied policy.
pub struct Direct;

impl Dispatch for Direct {
    fn dispatch(&self) -> usize {
        0
    }
}

pub(crate) fn make_dispatcher(strategy: DispatchStrategy, ctx_cnt: usize) -> Box<dyn Dispatch> {
    match strategy {
        DispatchStrategy::RoundRobin => Box::new(RoundRobin::new(ctx_cnt)),
        DispatchStrategy::Direct => Box::new(Direct),
    }
}
