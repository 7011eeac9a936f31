//! Basic ringloom example
//!
//! Spawns a handful of tasks across the workers, each doing a ring no-op
//! and a short timer, and rendezvous on a wait group.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ringloom::{Config, WaitGroup};

fn main() {
    tracing_subscriber::fmt::init();
    println!("=== ringloom basic example ===\n");

    ringloom::init(Config::from_env().ctx_count(4)).expect("scheduler init");

    let wg = Arc::new(WaitGroup::new());
    let sum = Arc::new(AtomicUsize::new(0));
    let workers = 8;
    wg.add(workers);

    for i in 0..workers as usize {
        let wg = wg.clone();
        let sum = sum.clone();
        ringloom::spawn(async move {
            let _ = ringloom::nop().await;
            ringloom::timeout(Duration::from_millis(10)).await.ok();
            sum.fetch_add(i, Ordering::Relaxed);
            println!("[task {}] done", i);
            wg.done();
        });
    }

    let wg2 = wg.clone();
    ringloom::spawn(async move {
        wg2.wait().await;
        println!("\nall tasks rendezvoused");
    });

    ringloom::run();
    println!("sum = {}", sum.load(Ordering::Relaxed));
}
