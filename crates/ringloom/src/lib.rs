//! # ringloom
//!
//! A multi-worker cooperative coroutine runtime over Linux io_uring.
//!
//! Each worker thread owns one engine: a bounded lock-free ready queue, an
//! io_uring instance, and an eventfd wake channel registered with the ring.
//! A process-wide scheduler fans submissions across workers; once a task
//! lands on a worker it stays there. Synchronization primitives resume
//! their waiters on the waiter's origin worker.
//!
//! ## Quick start
//!
//! ```ignore
//! use ringloom::{Config, WaitGroup};
//! use std::sync::Arc;
//!
//! fn main() {
//!     ringloom::init(Config::from_env()).unwrap();
//!
//!     let wg = Arc::new(WaitGroup::new());
//!     wg.add(4);
//!
//!     for _ in 0..4 {
//!         let wg = wg.clone();
//!         ringloom::spawn(async move {
//!             let _ = ringloom::nop().await;
//!             wg.done();
//!         });
//!     }
//!
//!     let wg2 = wg.clone();
//!     ringloom::spawn(async move {
//!         wg2.wait().await;
//!         println!("all done");
//!     });
//!
//!     // runs until every worker is idle, then stops them
//!     ringloom::run();
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      User tasks                         │
//! │          spawn(), submit(), wait_group, latch           │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Scheduler                          │
//! │        dispatch policy, idle tracking, stop/join        │
//! └─────────────────────────────────────────────────────────┘
//!            │                │                │
//!            ▼                ▼                ▼
//!      ┌──────────┐     ┌──────────┐     ┌──────────┐
//!      │ Context  │     │ Context  │     │ Context  │
//!      │  Engine  │     │  Engine  │     │  Engine  │
//!      │ io_uring │     │ io_uring │     │ io_uring │
//!      └──────────┘     └──────────┘     └──────────┘
//! ```

pub use ringloom_core::{
    Config, ConfigError, DispatchStrategy, RingError, SchedError, SchedResult,
};

pub use ringloom_runtime::context::Context;
pub use ringloom_runtime::engine::Engine;
pub use ringloom_runtime::scheduler::{self, Scheduler};
pub use ringloom_runtime::task::{Task, TaskHandle};

pub use ringloom_runtime::io::ops::{accept, nop, read, timeout, write};
pub use ringloom_runtime::sync::{Event, Latch, LatchGuard, WaitGroup};

// Global scheduler entry points
pub use ringloom_runtime::scheduler::{init, run, spawn, submit};
