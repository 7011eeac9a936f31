//! Worker contexts
//!
//! A context is a worker thread wrapping exactly one engine. The run loop
//! alternates a bounded drain of the ready queue with the engine's blocking
//! step, and invokes its stop callback when it observes quiescence: empty
//! ready queue, zero wait counter, no pending or in-flight I/O.
//!
//! The wait counter lets coroutines suspended on events the engine does not
//! track (a wait group, an event) hold the context alive: `register_wait`
//! before suspending, `unregister_wait` on resume.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::{self, JoinHandle};

use ringloom_core::{Config, SchedResult};

use crate::engine::{self, Engine};
use crate::meta;
use crate::task::{Task, TaskHandle};

pub type StopCallback = Box<dyn Fn() + Send + Sync>;

pub struct Context {
    engine: Engine,
    id: u32,
    /// Coroutines suspended on non-I/O events holding this context alive.
    wait_count: AtomicUsize,
    stop: AtomicBool,
    /// Invoked each time the run loop observes quiescence. The scheduler
    /// installs its idle-reporting callback here before start.
    stop_cb: OnceLock<StopCallback>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Context {
    pub fn new(config: &Config) -> SchedResult<Self> {
        Ok(Self {
            engine: Engine::new(config)?,
            id: meta::next_context_id(),
            wait_count: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
            stop_cb: OnceLock::new(),
            worker: Mutex::new(None),
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Install the quiescence callback. First call wins; must happen before
    /// `start`.
    pub fn set_stop_cb(&self, cb: StopCallback) {
        let _ = self.stop_cb.set(cb);
    }

    /// Launch the worker thread.
    pub fn start(self: &Arc<Self>) {
        let ctx = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(format!("ringloom-worker-{}", self.id))
            .spawn(move || {
                ctx.init();
                ctx.run();
                ctx.deinit();
            })
            .expect("failed to spawn worker thread");
        *self.worker.lock().unwrap() = Some(handle);
    }

    fn init(&self) {
        meta::set_local_context(self as *const Context);
        self.engine
            .init()
            .unwrap_or_else(|e| panic!("worker-{}: engine init failed: {}", self.id, e));
        tracing::debug!("worker-{} started", self.id);
    }

    fn deinit(&self) {
        self.engine.deinit();
        meta::clear_local_context();
        tracing::debug!("worker-{} stopped", self.id);
    }

    fn run(&self) {
        while !self.stop.load(Ordering::Acquire) {
            self.process_work();

            if self.empty_wait_task() {
                if !self.engine.ready() {
                    self.invoke_stop_cb();
                } else {
                    // new work arrived between the drain and the check
                    continue;
                }
            }

            self.poll_work();
        }
    }

    /// Drain a snapshot of the ready queue: exactly the handles observed at
    /// loop entry, so tasks that re-submit themselves run next iteration
    /// and completions get their turn.
    fn process_work(&self) {
        let num = self.engine.num_task_schedule();
        for _ in 0..num {
            if !self.engine.exec_one_task() {
                break;
            }
        }
    }

    fn poll_work(&self) {
        self.engine.poll_submit();
    }

    fn invoke_stop_cb(&self) {
        match self.stop_cb.get() {
            Some(cb) => cb(),
            // standalone context: stop yourself, and wake the engine so the
            // loop actually observes the request
            None => self.notify_stop(),
        }
    }

    /// Request the worker to stop at its next iteration boundary and wake
    /// it. Callable from any thread.
    pub fn notify_stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.engine.wake_up(engine::TASK_FLAG);
    }

    /// Wait for the worker thread to exit.
    pub fn join(&self) {
        let handle = self.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub(crate) fn worker_finished(&self) -> bool {
        self.worker
            .lock()
            .unwrap()
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }

    pub fn register_wait(&self, count: usize) {
        self.wait_count.fetch_add(count, Ordering::AcqRel);
    }

    pub fn unregister_wait(&self, count: usize) {
        self.wait_count.fetch_sub(count, Ordering::AcqRel);
    }

    /// Zero wait counter and no pending or in-flight I/O.
    pub fn empty_wait_task(&self) -> bool {
        self.wait_count.load(Ordering::Acquire) == 0 && self.engine.empty_io()
    }

    /// Quiescent: nothing queued, nothing waited on, nothing in flight.
    pub(crate) fn is_quiescent(&self) -> bool {
        self.empty_wait_task() && !self.engine.ready()
    }

    /// Submit a task, transferring its lifetime to the engine.
    pub fn submit(&self, task: Task) {
        let handle = task.detach();
        self.submit_handle(handle);
    }

    /// Submit a task the caller keeps ownership of. It must not run to
    /// completion while still owned at the call site.
    pub fn submit_ref(&self, task: &Task) {
        self.submit_handle(task.handle());
    }

    pub fn submit_handle(&self, handle: TaskHandle) {
        self.engine.submit_task(handle);
    }

    /// Create a detached task from `future` and submit it.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.submit(Task::new(future));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn test_config() -> Config {
        Config::new()
    }

    #[test]
    fn test_standalone_context_drains_and_stops() {
        let ctx = Arc::new(Context::new(&test_config()).unwrap());
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let hits = hits.clone();
            ctx.spawn(async move {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        ctx.start();
        ctx.join();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn test_empty_context_stops_itself() {
        let ctx = Arc::new(Context::new(&test_config()).unwrap());
        ctx.start();
        ctx.join();
        assert!(ctx.worker_finished());
    }

    #[test]
    fn test_wait_counter_holds_context_alive() {
        let ctx = Arc::new(Context::new(&test_config()).unwrap());
        ctx.register_wait(1);
        ctx.start();

        thread::sleep(Duration::from_millis(100));
        assert!(!ctx.worker_finished());

        ctx.unregister_wait(1);
        ctx.notify_stop();
        ctx.join();
        assert!(ctx.worker_finished());
    }

    #[test]
    fn test_cross_thread_submit_wakes_worker() {
        let ctx = Arc::new(Context::new(&test_config()).unwrap());
        let hits = Arc::new(AtomicUsize::new(0));

        // keep the context alive until the late task releases it
        ctx.register_wait(1);
        ctx.start();

        thread::sleep(Duration::from_millis(100));
        let hits2 = hits.clone();
        let ctx2 = ctx.clone();
        ctx.spawn(async move {
            hits2.fetch_add(1, Ordering::SeqCst);
            ctx2.unregister_wait(1);
        });

        ctx.join();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_self_resubmitting_task_runs_next_iteration() {
        let ctx = Arc::new(Context::new(&test_config()).unwrap());
        let order = Arc::new(Mutex::new(Vec::new()));

        let order1 = order.clone();
        let ctx1 = ctx.clone();
        ctx.spawn(async move {
            order1.lock().unwrap().push("first");
            let order = order1.clone();
            ctx1.spawn(async move {
                order.lock().unwrap().push("resubmitted");
            });
        });

        ctx.start();
        ctx.join();
        assert_eq!(*order.lock().unwrap(), vec!["first", "resubmitted"]);
    }
}
