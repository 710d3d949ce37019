//! Example demonstrating future-based waits and disposable schedules.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::executor::block_on;
use timers::{ResettableTimeout, sleep, start_interval};

fn main() {
    println!("=== Timers Example ===");

    // A future-based wait.
    println!("\n1. Sleeping for 50ms:");
    block_on(sleep(Duration::from_millis(50)));
    println!("awake again");

    // A periodic schedule released through its disposer.
    println!("\n2. A periodic tick, disposed after a while:");
    let ticks = Arc::new(AtomicU32::new(0));
    let ticks_in_callback = Arc::clone(&ticks);
    let handle = start_interval(Duration::from_millis(30), move || {
        let tick = ticks_in_callback.fetch_add(1, Ordering::SeqCst);
        println!("tick {tick}");
    });

    std::thread::sleep(Duration::from_millis(150));
    handle.dispose();
    println!("disposed after {} ticks", ticks.load(Ordering::SeqCst));

    // A deadline that survives as long as someone keeps resetting it.
    println!("\n3. Resettable timeout:");
    let timeout = ResettableTimeout::new(Duration::from_millis(100));

    std::thread::sleep(Duration::from_millis(50));
    timeout.reset();
    println!("reset pushed the deadline back; timed_out = {}", timeout.timed_out());

    block_on(timeout.on_timeout());
    println!("deadline elapsed; timed_out = {}", timeout.timed_out());
}
