//! Multi-producer stress demo
//!
//! Several OS threads hammer the scheduler with task submissions while the
//! workers drain them; a latch trips when the last task finishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use ringloom::{Config, Latch};

const PRODUCERS: usize = 4;
const TASKS_PER_PRODUCER: usize = 5_000;

fn main() {
    tracing_subscriber::fmt::init();
    println!("=== ringloom stress example ===\n");

    // submissions all land before the workers start draining, so the ready
    // queues must hold a whole producer burst
    let config = Config::from_env().ctx_count(4).queue_capacity(16384);
    ringloom::init(config).expect("scheduler init");

    let total = PRODUCERS * TASKS_PER_PRODUCER;
    let latch = Arc::new(Latch::new(total as i64));
    let executed = Arc::new(AtomicUsize::new(0));

    let started = Instant::now();
    let mut producers = Vec::new();
    for p in 0..PRODUCERS {
        let latch = latch.clone();
        let executed = executed.clone();
        producers.push(thread::spawn(move || {
            for _ in 0..TASKS_PER_PRODUCER {
                let latch = latch.clone();
                let executed = executed.clone();
                ringloom::spawn(async move {
                    executed.fetch_add(1, Ordering::Relaxed);
                    latch.count_down();
                });
            }
            println!("[producer {}] submitted {} tasks", p, TASKS_PER_PRODUCER);
        }));
    }
    for producer in producers {
        producer.join().unwrap();
    }

    let latch2 = latch.clone();
    ringloom::spawn(async move {
        latch2.wait().await;
        println!("\nlatch tripped");
    });

    ringloom::run();

    println!(
        "executed {} / {} tasks in {:?}",
        executed.load(Ordering::Relaxed),
        total,
        started.elapsed()
    );
}
