//! Multi-worker scheduler
//!
//! Owns N contexts and fans submissions across them through a dispatch
//! policy. Termination: each context reports idle through its stop
//! callback, which swaps a per-context cache-line-aligned flag and
//! decrements the global stop token exactly once. When the token reaches
//! zero the scheduler re-verifies every context (one may have gone busy
//! again after reporting), re-arms the token for any that did, and only
//! when all are quiescent signals stop and joins them.

use std::future::Future;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

use ringloom_core::{CacheAligned, Config, ConfigError, SchedError, SchedResult};

use crate::context::Context;
use crate::dispatcher::{make_dispatcher, Dispatch};
use crate::task::{Task, TaskHandle};

struct StopState {
    /// Counts contexts that have not yet reported idle.
    token: AtomicI32,
    /// Per-context idle flag; one cache line each so neighbors don't
    /// false-share.
    flags: Box<[CacheAligned<AtomicI32>]>,
}

pub struct Scheduler {
    ctx_cnt: usize,
    ctxs: Vec<Arc<Context>>,
    dispatcher: Box<dyn Dispatch>,
    stop_state: Arc<StopState>,
}

impl Scheduler {
    /// Construct `ctx_count` contexts (hardware concurrency when 0) and
    /// wire their idle reporting.
    pub fn new(config: Config) -> SchedResult<Self> {
        config.validate().map_err(|e| match e {
            ConfigError::InvalidValue(msg) => SchedError::InvalidConfig(msg),
        })?;

        let ctx_cnt = if config.ctx_count == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            config.ctx_count
        };

        let mut ctxs = Vec::with_capacity(ctx_cnt);
        for _ in 0..ctx_cnt {
            ctxs.push(Arc::new(Context::new(&config)?));
        }

        let flags: Box<[CacheAligned<AtomicI32>]> = (0..ctx_cnt)
            .map(|_| CacheAligned::new(AtomicI32::new(0)))
            .collect();
        let stop_state = Arc::new(StopState {
            token: AtomicI32::new(ctx_cnt as i32),
            flags,
        });

        for (i, ctx) in ctxs.iter().enumerate() {
            let state = Arc::clone(&stop_state);
            ctx.set_stop_cb(Box::new(move || {
                // idempotent: only the first idle report decrements
                if state.flags[i].0.swap(1, Ordering::AcqRel) == 0 {
                    state.token.fetch_sub(1, Ordering::AcqRel);
                }
            }));
        }

        tracing::debug!("scheduler: {} contexts", ctx_cnt);
        Ok(Self {
            ctx_cnt,
            ctxs,
            dispatcher: make_dispatcher(config.dispatch, ctx_cnt),
            stop_state,
        })
    }

    pub fn ctx_count(&self) -> usize {
        self.ctx_cnt
    }

    pub fn contexts(&self) -> &[Arc<Context>] {
        &self.ctxs
    }

    /// Submit a task, transferring its lifetime to the chosen context.
    pub fn submit(&self, task: Task) {
        let handle = task.detach();
        self.submit_handle(handle);
    }

    /// Submit a task the caller keeps ownership of.
    pub fn submit_ref(&self, task: &Task) {
        self.submit_handle(task.handle());
    }

    pub fn submit_handle(&self, handle: TaskHandle) {
        let idx = self.dispatcher.dispatch();
        self.ctxs[idx].submit_handle(handle);
    }

    /// Create a detached task from `future` and submit it.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit(Task::new(future));
    }

    /// Start all contexts, wait until every one is durably idle, then stop
    /// and join them.
    pub fn run(&self) {
        for ctx in &self.ctxs {
            ctx.start();
        }

        loop {
            while self.stop_state.token.load(Ordering::Acquire) > 0 {
                thread::yield_now();
            }

            // every context reported idle once; re-verify before stopping
            let mut all_idle = true;
            for (i, ctx) in self.ctxs.iter().enumerate() {
                if !ctx.is_quiescent() {
                    all_idle = false;
                    if self.stop_state.flags[i].0.swap(0, Ordering::AcqRel) == 1 {
                        self.stop_state.token.fetch_add(1, Ordering::AcqRel);
                    }
                }
            }
            if all_idle {
                break;
            }
        }

        for ctx in &self.ctxs {
            ctx.notify_stop();
        }
        for ctx in &self.ctxs {
            ctx.join();
        }
        tracing::debug!("scheduler: all contexts joined");
    }
}

static GLOBAL: OnceLock<Scheduler> = OnceLock::new();

/// Initialize the process-global scheduler. Once.
pub fn init(config: Config) -> SchedResult<()> {
    GLOBAL
        .set(Scheduler::new(config)?)
        .map_err(|_| SchedError::AlreadyInitialized)
}

/// The process-global scheduler.
pub fn global() -> &'static Scheduler {
    GLOBAL
        .get()
        .expect("scheduler not initialized, call scheduler::init first")
}

/// Spawn a detached task onto the global scheduler.
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    global().spawn(future);
}

/// Submit a task to the global scheduler, transferring its lifetime.
pub fn submit(task: Task) {
    global().submit(task);
}

/// Run the global scheduler until every context is idle.
pub fn run() {
    global().run();
}
