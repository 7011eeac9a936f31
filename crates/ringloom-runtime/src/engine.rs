//! Per-worker execution engine
//!
//! One engine per worker thread. Owns a uring proxy, a bounded lock-free
//! MPMC queue of ready task handles, and the pending/in-flight io counters
//! that drive the context's quiescence test.
//!
//! Concurrency contract: only the owning thread calls `poll_submit`,
//! `exec_one_task`, `schedule`, `submit_io` and the uring accessor. Any
//! thread may call `submit_task` and `wake_up`.

use std::cell::UnsafeCell;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crossbeam_queue::ArrayQueue;
use io_uring::squeue;
use ringloom_core::{Config, SchedResult};

use crate::io::info::IoInfo;
use crate::meta;
use crate::task::TaskHandle;
use crate::uring::{self, UringProxy};

/// Eventfd counter bits [63:44]: task-submission wakes.
pub const TASK_MASK: u64 = 0xFFFF_F000_0000_0000;
/// Eventfd counter bits [43:24]: explicit I/O wakes.
pub const IO_MASK: u64 = 0x0000_0FFF_FF00_0000;
/// Eventfd counter bits [23:0]: kernel CQE notifications.
pub const CQE_MASK: u64 = 0x0000_0000_00FF_FFFF;

/// One task-submission wake.
pub const TASK_FLAG: u64 = 1 << 44;
/// One explicit I/O wake.
pub const IO_FLAG: u64 = 1 << 24;

#[inline]
pub fn wake_by_task(val: u64) -> bool {
    val & TASK_MASK > 0
}

#[inline]
pub fn wake_by_io(val: u64) -> bool {
    val & IO_MASK > 0
}

#[inline]
pub fn wake_by_cqe(val: u64) -> bool {
    val & CQE_MASK > 0
}

/// State confined to the owning thread.
struct EngineInner {
    uring: Option<UringProxy>,
    /// Reused completion drain buffer.
    cqe_buf: Vec<(u64, i32)>,
}

/// Per-worker runtime state. Non-movable once initialized: the thread-local
/// slot and task headers hold raw pointers to it.
#[repr(align(64))]
pub struct Engine {
    id: u32,
    event_fd: OwnedFd,
    task_queue: ArrayQueue<TaskHandle>,
    /// Pending submissions not yet committed to the kernel. Owner-written,
    /// relaxed reads from other threads serve the quiescence test only.
    num_io_wait_submit: AtomicUsize,
    /// Committed submissions whose CQEs have not been drained.
    num_io_running: AtomicUsize,
    /// Inline-resume depth while the ready queue overflows.
    recursive_depth: AtomicUsize,
    /// Tasks dropped on overflow; the observable overload signal.
    discarded: AtomicU64,
    max_recursive_depth: usize,
    ring_entries: u32,
    fixed_fd_slots: u32,
    inner: UnsafeCell<EngineInner>,
}

// Safety: `inner` is only touched by the owning thread (see the concurrency
// contract above); everything else is atomics, the lock-free queue, or an
// eventfd write, all safe from any thread.
unsafe impl Send for Engine {}
unsafe impl Sync for Engine {}

impl Engine {
    pub fn new(config: &Config) -> SchedResult<Self> {
        let fd = uring::create_eventfd()?;
        Ok(Self {
            id: meta::next_engine_id(),
            event_fd: unsafe { OwnedFd::from_raw_fd(fd) },
            task_queue: ArrayQueue::new(config.queue_capacity),
            num_io_wait_submit: AtomicUsize::new(0),
            num_io_running: AtomicUsize::new(0),
            recursive_depth: AtomicUsize::new(0),
            discarded: AtomicU64::new(0),
            max_recursive_depth: config.max_recursive_depth,
            ring_entries: config.ring_entries,
            fixed_fd_slots: config.fixed_fd_slots,
            inner: UnsafeCell::new(EngineInner {
                uring: None,
                cqe_buf: Vec::new(),
            }),
        })
    }

    /// Bind the engine to the calling thread, zero the counters and boot
    /// the uring proxy.
    pub fn init(&self) -> SchedResult<()> {
        meta::set_local_engine(self as *const Engine);
        self.num_io_wait_submit.store(0, Ordering::Relaxed);
        self.num_io_running.store(0, Ordering::Relaxed);
        self.recursive_depth.store(0, Ordering::Relaxed);

        // Safety: init runs on the owning thread before any other owner call
        let inner = unsafe { &mut *self.inner.get() };
        inner.uring = Some(UringProxy::new(
            self.ring_entries,
            self.event_fd.as_raw_fd(),
            self.fixed_fd_slots,
        )?);
        inner.cqe_buf.clear();
        Ok(())
    }

    /// Tear down the proxy, clear the counters and destroy any stragglers
    /// left in the ready queue.
    pub fn deinit(&self) {
        // Safety: owner thread only
        let inner = unsafe { &mut *self.inner.get() };
        inner.uring = None;

        self.num_io_wait_submit.store(0, Ordering::Relaxed);
        self.num_io_running.store(0, Ordering::Relaxed);
        self.recursive_depth.store(0, Ordering::Relaxed);

        let mut leftover = 0usize;
        while let Some(handle) = self.task_queue.pop() {
            handle.destroy();
            leftover += 1;
        }
        if leftover > 0 {
            tracing::warn!(
                "engine-{}: destroyed {} tasks left in ready queue at deinit",
                self.id,
                leftover
            );
        }

        if meta::local_engine_ptr() == self as *const Engine {
            meta::clear_local_engine();
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether the ready queue is non-empty.
    pub fn ready(&self) -> bool {
        !self.task_queue.is_empty()
    }

    /// Number of handles currently queued.
    pub fn num_task_schedule(&self) -> usize {
        self.task_queue.len()
    }

    /// No pending and no in-flight I/O.
    pub fn empty_io(&self) -> bool {
        self.num_io_wait_submit.load(Ordering::Relaxed) == 0
            && self.num_io_running.load(Ordering::Relaxed) == 0
    }

    /// Tasks dropped on overflow since init.
    pub fn discarded_tasks(&self) -> u64 {
        self.discarded.load(Ordering::Relaxed)
    }

    /// Pop the next ready handle.
    pub fn schedule(&self) -> Option<TaskHandle> {
        self.task_queue.pop()
    }

    /// Hand a task handle to this engine. Callable from any thread.
    ///
    /// On overflow, a submitter already on a worker thread resumes the
    /// handle inline (bounded by the recursion depth limit); otherwise the
    /// handle is dropped and counted.
    pub fn submit_task(&self, handle: TaskHandle) {
        if self.task_queue.push(handle).is_ok() {
            self.wake_up(TASK_FLAG);
            return;
        }

        if meta::in_worker() {
            if self.recursive_depth.load(Ordering::Relaxed) < self.max_recursive_depth {
                self.recursive_depth.fetch_add(1, Ordering::Relaxed);
                self.exec_task(handle);
                self.recursive_depth.fetch_sub(1, Ordering::Relaxed);
                return;
            }
            self.discarded.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                "engine-{}: inline resume depth limit reached, task discarded",
                self.id
            );
            return;
        }

        self.discarded.fetch_add(1, Ordering::Relaxed);
        tracing::error!("engine-{}: ready queue full, task discarded", self.id);
    }

    /// Pop one handle and run it. Returns false when the queue was empty.
    pub fn exec_one_task(&self) -> bool {
        match self.schedule() {
            Some(handle) => {
                self.exec_task(handle);
                true
            }
            None => false,
        }
    }

    fn exec_task(&self, handle: TaskHandle) {
        handle.resume();
        if handle.done() {
            handle.destroy();
        }
    }

    /// Queue one SQE and count it as pending. Owner thread only.
    ///
    /// A full submission queue is flushed to the kernel until the entry
    /// fits.
    pub fn submit_io(&self, sqe: squeue::Entry) {
        // Safety: owner thread only
        let inner = unsafe { &mut *self.inner.get() };
        let uring = inner.uring.as_mut().expect("engine not initialized");
        while !uring.push_sqe(&sqe) {
            if let Err(e) = uring.submit() {
                tracing::error!("engine-{}: flush on full SQ failed: {}", self.id, e);
            }
        }
        self.num_io_wait_submit.fetch_add(1, Ordering::Relaxed);
    }

    /// The engine's blocking step: commit pending SQEs, block on the
    /// eventfd, and if the wake carries completions, drain them and run
    /// their callbacks.
    pub fn poll_submit(&self) {
        let n;
        let mut buf;
        {
            // Safety: owner thread only
            let inner = unsafe { &mut *self.inner.get() };
            buf = std::mem::take(&mut inner.cqe_buf);
            let uring = inner.uring.as_mut().expect("engine not initialized");

            let pending = self.num_io_wait_submit.load(Ordering::Relaxed);
            if pending > 0 {
                match uring.submit() {
                    Ok(_) => {
                        self.num_io_running.fetch_add(pending, Ordering::Relaxed);
                        self.num_io_wait_submit.fetch_sub(pending, Ordering::Relaxed);
                    }
                    // pending count stays; retried on the next poll
                    Err(e) => tracing::error!("engine-{}: ring submit failed: {}", self.id, e),
                }
            }

            let cnt = uring.wait_eventfd();
            if !wake_by_cqe(cnt) {
                inner.cqe_buf = buf;
                return;
            }

            let running = self.num_io_running.load(Ordering::Relaxed);
            n = uring.reap_completions(running, &mut buf);
        }

        // The inner borrow is released: callbacks may re-enter submit paths.
        for &(user_data, res) in &buf[..n] {
            let info = user_data as *mut IoInfo;
            debug_assert!(!info.is_null());
            unsafe { ((*info).cb)(info, res) };
        }
        self.num_io_running.fetch_sub(n, Ordering::Relaxed);

        // Safety: owner thread only
        let inner = unsafe { &mut *self.inner.get() };
        inner.cqe_buf = buf;
    }

    /// Write `val` into the eventfd, waking a blocked `poll_submit`.
    /// Callable from any thread.
    pub fn wake_up(&self, val: u64) {
        uring::write_eventfd(self.event_fd.as_raw_fd(), val);
    }

    /// The uring proxy. Owner thread only.
    ///
    /// # Safety
    ///
    /// Must be called on the owning thread, between `init` and `deinit`,
    /// with no other live borrow of the proxy.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn uring(&self) -> &mut UringProxy {
        (*self.inner.get())
            .uring
            .as_mut()
            .expect("engine not initialized")
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        while let Some(handle) = self.task_queue.pop() {
            handle.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;
    use io_uring::opcode;
    use std::sync::atomic::{AtomicI32, AtomicUsize};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    fn test_config() -> Config {
        Config::new()
    }

    fn push_value_task(vec: &Arc<Mutex<Vec<i32>>>, val: i32) -> Task {
        let vec = vec.clone();
        Task::new(async move {
            vec.lock().unwrap().push(val);
        })
    }

    /// Callback that only stores the result into the slot `data` points at.
    fn store_result_cb(info: *mut IoInfo, res: i32) {
        unsafe {
            let slot = (*info).data as *const AtomicI32;
            (*slot).store(res, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_init_state() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();

        assert!(!engine.ready());
        assert!(engine.empty_io());
        assert_eq!(engine.num_task_schedule(), 0);
        assert_eq!(meta::local_engine_ptr(), &engine as *const Engine);

        engine.deinit();
        assert!(meta::local_engine_ptr().is_null());
    }

    #[test]
    fn test_exec_one_detached_task_by_user() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let task = push_value_task(&vec, 1);
        let handle = task.detach();
        engine.submit_task(handle);

        assert!(engine.ready());
        assert_eq!(engine.num_task_schedule(), 1);

        let handle = engine.schedule().unwrap();
        assert!(!engine.ready());
        assert_eq!(engine.num_task_schedule(), 0);

        handle.resume();
        assert_eq!(*vec.lock().unwrap(), vec![1]);
        handle.destroy();

        engine.deinit();
    }

    #[test]
    fn test_exec_many_detached_tasks_by_user() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        const TASK_NUM: i32 = 100;
        for i in 0..TASK_NUM {
            let task = push_value_task(&vec, i);
            let handle = task.detach();
            engine.submit_task(handle);
        }
        assert!(engine.ready());
        assert_eq!(engine.num_task_schedule(), TASK_NUM as usize);

        while engine.ready() {
            let handle = engine.schedule().unwrap();
            handle.resume();
            handle.destroy();
        }
        assert_eq!(engine.num_task_schedule(), 0);

        let mut collected = vec.lock().unwrap().clone();
        collected.sort_unstable();
        assert_eq!(collected, (0..TASK_NUM).collect::<Vec<_>>());

        engine.deinit();
    }

    #[test]
    fn test_single_producer_fifo_order() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let task = push_value_task(&vec, i);
            engine.submit_task(task.detach());
        }
        // one producer, no interleaving: pops come back in submission order
        while let Some(handle) = engine.schedule() {
            handle.resume();
            handle.destroy();
        }
        assert_eq!(*vec.lock().unwrap(), (0..10).collect::<Vec<_>>());

        engine.deinit();
    }

    #[test]
    fn test_exec_one_detached_task_by_engine() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let task = push_value_task(&vec, 1);
        let handle = task.detach();
        engine.submit_task(handle);

        assert!(engine.ready());
        assert!(engine.exec_one_task());
        assert!(!engine.ready());
        assert_eq!(*vec.lock().unwrap(), vec![1]);

        engine.deinit();
    }

    #[test]
    fn test_batch_nop_io() {
        for task_num in [1usize, 100, 10000] {
            let config = test_config().ring_entries(16384);
            let engine = Engine::new(&config).unwrap();
            engine.init().unwrap();

            let slots: Vec<AtomicI32> = (0..task_num).map(|_| AtomicI32::new(1)).collect();
            let mut infos: Vec<IoInfo> = (0..task_num)
                .map(|i| {
                    let mut info = IoInfo::new(store_result_cb);
                    info.data = &slots[i] as *const AtomicI32 as usize;
                    info
                })
                .collect();

            for info in infos.iter_mut() {
                let sqe = opcode::Nop::new().build().user_data(info.user_data());
                engine.submit_io(sqe);
            }
            assert!(!engine.empty_io());

            while !engine.empty_io() {
                engine.poll_submit();
            }

            for slot in &slots {
                assert_eq!(slot.load(Ordering::SeqCst), 0);
            }
            engine.deinit();
        }
    }

    #[test]
    fn test_loop_nop_io_reuses_ring() {
        let config = test_config().ring_entries(8);
        let engine = Engine::new(&config).unwrap();
        engine.init().unwrap();

        let slot = AtomicI32::new(1);
        for _ in 0..32 {
            slot.store(1, Ordering::SeqCst);
            let mut info = IoInfo::new(store_result_cb);
            info.data = &slot as *const AtomicI32 as usize;

            let sqe = opcode::Nop::new().build().user_data(info.user_data());
            engine.submit_io(sqe);

            while !engine.empty_io() {
                engine.poll_submit();
            }
            assert_eq!(slot.load(Ordering::SeqCst), 0);
        }

        engine.deinit();
    }

    #[test]
    fn test_poll_then_cross_thread_submit() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let task = push_value_task(&vec, 2);
        let handle = task.detach();

        thread::scope(|s| {
            s.spawn(|| {
                engine.poll_submit();
                assert!(engine.ready());
                assert_eq!(engine.num_task_schedule(), 1);
                assert!(engine.empty_io());
            });
            let engine = &engine;
            s.spawn(move || {
                thread::sleep(Duration::from_millis(100));
                engine.submit_task(handle);
            });
        });

        assert!(engine.exec_one_task());
        assert_eq!(*vec.lock().unwrap(), vec![2]);
        engine.deinit();
    }

    #[test]
    fn test_cross_thread_submit_then_poll() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let task = push_value_task(&vec, 2);
        let handle = task.detach();

        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(Duration::from_millis(100));
                engine.poll_submit();
                assert!(engine.ready());
                assert_eq!(engine.num_task_schedule(), 1);
                assert!(engine.empty_io());
                assert!(engine.exec_one_task());
            });
            let engine = &engine;
            s.spawn(move || {
                engine.submit_task(handle);
            });
        });

        assert_eq!(*vec.lock().unwrap(), vec![2]);
        engine.deinit();
    }

    #[test]
    fn test_multi_producer_single_consumer() {
        for producers in [1usize, 10, 100] {
            let engine = Arc::new(Engine::new(&test_config()).unwrap());
            engine.init().unwrap();
            let vec = Arc::new(Mutex::new(Vec::new()));

            let consumer = {
                let engine = engine.clone();
                thread::spawn(move || {
                    let mut count = 0usize;
                    while count < producers {
                        engine.poll_submit();
                        while engine.exec_one_task() {
                            count += 1;
                        }
                    }
                })
            };

            let mut threads = Vec::new();
            for i in 0..producers {
                let engine = engine.clone();
                let vec = vec.clone();
                threads.push(thread::spawn(move || {
                    let task = push_value_task(&vec, i as i32);
                    let handle = task.detach();
                    engine.submit_task(handle);
                }));
            }

            consumer.join().unwrap();
            for t in threads {
                t.join().unwrap();
            }

            let mut collected = vec.lock().unwrap().clone();
            collected.sort_unstable();
            assert_eq!(collected, (0..producers as i32).collect::<Vec<_>>());

            engine.deinit();
        }
    }

    #[test]
    fn test_mixed_tasks_and_nop_io() {
        for (task_num, nopio_num) in
            [(1usize, 1usize), (100, 100), (1000, 1000), (10000, 10000)]
        {
            // the largest round can have every nop in flight at once
            let config = test_config().ring_entries(16384).queue_capacity(32768);
            let engine = Arc::new(Engine::new(&config).unwrap());
            let appended = Arc::new(Mutex::new(Vec::new()));
            let io_slots: Arc<Vec<AtomicI32>> =
                Arc::new((0..nopio_num).map(|_| AtomicI32::new(1)).collect());

            let task_thread = {
                let engine = engine.clone();
                let appended = appended.clone();
                thread::spawn(move || {
                    for i in 0..task_num {
                        let task = push_value_task(&appended, (nopio_num + i) as i32);
                        let handle = task.detach();
                        engine.submit_task(handle);
                        if (i + 1) % 100 == 0 {
                            thread::sleep(Duration::from_millis(10));
                        }
                    }
                })
            };

            let io_thread = {
                let engine = engine.clone();
                let appended = appended.clone();
                let io_slots = io_slots.clone();
                thread::spawn(move || {
                    for i in 0..nopio_num {
                        let io_slots = io_slots.clone();
                        let task = Task::new(async move {
                            let res = crate::io::ops::nop().await;
                            io_slots[i].store(res, Ordering::SeqCst);
                        });
                        let handle = task.detach();
                        engine.submit_task(handle);
                        if (i + 1) % 100 == 0 {
                            thread::sleep(Duration::from_millis(10));
                        }
                    }
                    // makes the poll thread finish after the io thread
                    let task = push_value_task(&appended, (task_num + nopio_num) as i32);
                    let handle = task.detach();
                    engine.submit_task(handle);
                })
            };

            let poll_thread = {
                let engine = engine.clone();
                thread::spawn(move || {
                    engine.init().unwrap();

                    // every io task is executed twice: submit, then resume
                    let mut count = 0usize;
                    while count < 2 * nopio_num + task_num + 1 {
                        engine.poll_submit();
                        while engine.exec_one_task() {
                            count += 1;
                        }
                    }
                    engine.deinit();
                })
            };

            task_thread.join().unwrap();
            io_thread.join().unwrap();
            poll_thread.join().unwrap();

            for slot in io_slots.iter() {
                assert_eq!(slot.load(Ordering::SeqCst), 0);
            }
            let mut collected = appended.lock().unwrap().clone();
            collected.sort_unstable();
            assert_eq!(
                collected,
                (nopio_num as i32..=(task_num + nopio_num) as i32).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn test_overflow_discards_off_worker() {
        let config = test_config().queue_capacity(4);
        let engine = Engine::new(&config).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<Task> = (0..6).map(|i| push_value_task(&vec, i)).collect();
        for task in &tasks {
            engine.submit_task(task.handle());
        }

        // not on a worker thread: the two overflow submissions are dropped
        assert_eq!(engine.num_task_schedule(), 4);
        assert_eq!(engine.discarded_tasks(), 2);

        while engine.ready() {
            let handle = engine.schedule().unwrap();
            handle.resume();
        }
        assert_eq!(vec.lock().unwrap().len(), 4);
        // completed and dropped tasks alike are destroyed by their owner
        drop(tasks);

        engine.deinit();
    }

    #[test]
    fn test_overflow_inlines_on_worker() {
        use crate::context::Context;

        let config = test_config().queue_capacity(2);
        let engine = Engine::new(&config).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        // publish a context so the engine sees a worker thread
        let ctx = Context::new(&test_config()).unwrap();
        meta::set_local_context(&ctx as *const Context);

        for i in 0..5 {
            let task = push_value_task(&vec, i);
            engine.submit_task(task.detach());
        }
        // three submissions overflowed and ran inline on this stack
        assert_eq!(engine.num_task_schedule(), 2);
        assert_eq!(vec.lock().unwrap().len(), 3);
        assert_eq!(engine.discarded_tasks(), 0);

        while engine.exec_one_task() {}
        assert_eq!(vec.lock().unwrap().len(), 5);

        meta::clear_local_context();
        engine.deinit();
    }

    #[test]
    fn test_overflow_depth_limit_discards() {
        use crate::context::Context;

        let config = test_config().queue_capacity(2).max_recursive_depth(0);
        let engine = Engine::new(&config).unwrap();
        engine.init().unwrap();
        let vec = Arc::new(Mutex::new(Vec::new()));

        let ctx = Context::new(&test_config()).unwrap();
        meta::set_local_context(&ctx as *const Context);

        let tasks: Vec<Task> = (0..4).map(|i| push_value_task(&vec, i)).collect();
        for task in &tasks {
            engine.submit_task(task.handle());
        }
        assert_eq!(engine.num_task_schedule(), 2);
        assert_eq!(engine.discarded_tasks(), 2);

        while engine.ready() {
            let handle = engine.schedule().unwrap();
            handle.resume();
        }
        drop(tasks);

        meta::clear_local_context();
        engine.deinit();
    }

    #[test]
    fn test_deinit_destroys_stragglers() {
        let engine = Engine::new(&test_config()).unwrap();
        engine.init().unwrap();

        let drops = Arc::new(AtomicUsize::new(0));

        struct DropProbe(Arc<AtomicUsize>);
        impl Drop for DropProbe {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        for _ in 0..3 {
            let probe = DropProbe(drops.clone());
            let task = Task::new(async move {
                let _probe = probe;
            });
            engine.submit_task(task.detach());
        }

        engine.deinit();
        assert_eq!(drops.load(Ordering::SeqCst), 3);
        assert!(!engine.ready());
        assert!(engine.empty_io());
        assert_eq!(engine.num_task_schedule(), 0);
    }

    #[test]
    fn test_wake_classification() {
        assert!(wake_by_task(TASK_FLAG));
        assert!(!wake_by_io(TASK_FLAG));
        assert!(!wake_by_cqe(TASK_FLAG));

        assert!(wake_by_io(IO_FLAG));
        assert!(!wake_by_task(IO_FLAG));

        assert!(wake_by_cqe(1));
        assert!(wake_by_cqe(TASK_FLAG | 3));
        assert!(wake_by_task(TASK_FLAG | 3));
    }
}
