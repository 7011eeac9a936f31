//! Synchronization primitives
//!
//! All of them follow the same resumption rule: a waiter records its origin
//! context before suspending, and whoever signals re-submits the waiter's
//! handle to that context. Waiters bump their context's wait counter while
//! suspended so the quiescence test stays accurate.

pub mod event;
pub mod latch;
pub mod wait_group;

pub use event::Event;
pub use latch::{Latch, LatchGuard};
pub use wait_group::WaitGroup;
