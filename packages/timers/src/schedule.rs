use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use disposables::Disposer;

use crate::{ERR_POISONED_LOCK, deadline_after};

#[derive(Debug)]
struct ScheduleShared {
    cancelled: Mutex<bool>,
    wakeup: Condvar,
}

fn cancel_disposer(shared: &Arc<ScheduleShared>) -> Disposer {
    let shared = Arc::clone(shared);

    Disposer::new(move || {
        *shared.cancelled.lock().expect(ERR_POISONED_LOCK) = true;
        shared.wakeup.notify_one();
    })
}

/// Parks until `deadline` or cancellation, whichever comes first.
///
/// Returns whether the schedule was cancelled.
fn wait_until(shared: &ScheduleShared, deadline: Instant) -> bool {
    let mut cancelled = shared.cancelled.lock().expect(ERR_POISONED_LOCK);

    loop {
        if *cancelled {
            return true;
        }

        let now = Instant::now();

        if now >= deadline {
            return false;
        }

        let remaining = deadline.saturating_duration_since(now);
        let (guard, _timed_out) = shared
            .wakeup
            .wait_timeout(cancelled, remaining)
            .expect(ERR_POISONED_LOCK);
        cancelled = guard;
    }
}

/// Runs `callback` once, `duration` from now, unless disposed first.
///
/// The callback runs on the timer's watcher thread. Disposing the returned
/// handle before the deadline cancels the schedule; disposing afterwards is
/// a no-op.
pub fn start_timeout<F>(duration: Duration, callback: F) -> Disposer
where
    F: FnOnce() + Send + 'static,
{
    let shared = Arc::new(ScheduleShared {
        cancelled: Mutex::new(false),
        wakeup: Condvar::new(),
    });

    let watcher = Arc::clone(&shared);
    thread::spawn(move || {
        let deadline = deadline_after(duration);

        if !wait_until(&watcher, deadline) {
            callback();
        }
    });

    cancel_disposer(&shared)
}

/// Runs `callback` every `period` until the returned handle is disposed.
///
/// The callback runs on the timer's watcher thread. The first invocation
/// happens one full period from now; for a leading invocation see
/// [`start_interval_immediate`].
pub fn start_interval<F>(period: Duration, callback: F) -> Disposer
where
    F: FnMut() + Send + 'static,
{
    let shared = Arc::new(ScheduleShared {
        cancelled: Mutex::new(false),
        wakeup: Condvar::new(),
    });

    let watcher = Arc::clone(&shared);
    thread::spawn(move || interval_watcher(&watcher, period, callback));

    cancel_disposer(&shared)
}

/// Like [`start_interval`], but also invokes `callback` once synchronously
/// on the calling thread before the periodic schedule starts.
pub fn start_interval_immediate<F>(period: Duration, mut callback: F) -> Disposer
where
    F: FnMut() + Send + 'static,
{
    callback();

    start_interval(period, callback)
}

fn interval_watcher<F>(shared: &ScheduleShared, period: Duration, mut callback: F)
where
    F: FnMut(),
{
    loop {
        let deadline = deadline_after(period);

        if wait_until(shared, deadline) {
            return;
        }

        callback();
    }
}
