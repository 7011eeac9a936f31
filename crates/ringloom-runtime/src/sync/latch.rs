//! Latch
//!
//! A decrementing counter wrapping an [`Event`]: the transition to zero or
//! below sets the event once. Safe for concurrent `count_down` from any
//! thread; constructed with a non-positive count it starts signaled.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::sync::event::{Event, EventWait};

pub struct Latch {
    count: AtomicI64,
    ev: Event,
}

impl Latch {
    pub fn new(count: i64) -> Self {
        Self {
            count: AtomicI64::new(count),
            ev: Event::with_state(count <= 0),
        }
    }

    pub fn count_down(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) <= 1 {
            self.ev.set();
        }
    }

    pub fn wait(&self) -> EventWait<'_> {
        self.ev.wait()
    }
}

/// Scoped guard counting the latch down when dropped.
pub struct LatchGuard<'a> {
    latch: &'a Latch,
}

impl<'a> LatchGuard<'a> {
    pub fn new(latch: &'a Latch) -> Self {
        Self { latch }
    }
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
