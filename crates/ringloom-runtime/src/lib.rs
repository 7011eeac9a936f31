//! # ringloom-runtime
//!
//! Per-thread cooperative coroutine runtime over Linux io_uring.
//!
//! This crate provides:
//! - Raw task cells and handles (`task`)
//! - The io_uring proxy with its eventfd wake channel (`uring`)
//! - The per-worker engine: ready queue + ring + io counters (`engine`)
//! - Worker contexts wrapping one engine each (`context`)
//! - The multi-worker scheduler and dispatch policies (`scheduler`,
//!   `dispatcher`)
//! - I/O awaiters honoring the engine's submission contract (`io`)
//! - Synchronization primitives that reschedule waiters on their origin
//!   context (`sync`)

pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod io;
pub mod meta;
pub mod scheduler;
pub mod sync;
pub mod task;
pub mod uring;

// Re-exports
pub use context::Context;
pub use engine::Engine;
pub use scheduler::Scheduler;
pub use task::{Task, TaskHandle};
