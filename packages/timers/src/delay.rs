use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll, Waker};
use std::thread;
use std::time::{Duration, Instant};

use crate::{ERR_POISONED_LOCK, deadline_after};

#[derive(Debug)]
struct DelayShared {
    state: Mutex<DelayState>,
    wakeup: Condvar,
}

#[derive(Debug)]
struct DelayState {
    deadline: Instant,
    fired: bool,
    abandoned: bool,
    waker: Option<Waker>,
}

/// A future that completes once a duration has elapsed.
///
/// Created by [`sleep`] or [`Delay::new`]. Dropping it before the deadline
/// releases the watcher without firing.
///
/// # Example
///
/// ```rust
/// use std::time::{Duration, Instant};
///
/// use timers::sleep;
///
/// let start = Instant::now();
/// futures::executor::block_on(sleep(Duration::from_millis(20)));
/// assert!(start.elapsed() >= Duration::from_millis(20));
/// ```
pub struct Delay {
    shared: Arc<DelayShared>,
}

impl Delay {
    /// Creates a delay that elapses `duration` from now.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        let shared = Arc::new(DelayShared {
            state: Mutex::new(DelayState {
                deadline: deadline_after(duration),
                fired: false,
                abandoned: false,
                waker: None,
            }),
            wakeup: Condvar::new(),
        });

        let watcher = Arc::clone(&shared);
        thread::spawn(move || delay_watcher(&watcher));

        Self { shared }
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        self.shared.state.lock().expect(ERR_POISONED_LOCK).fired
    }
}

fn delay_watcher(shared: &DelayShared) {
    let mut state = shared.state.lock().expect(ERR_POISONED_LOCK);

    loop {
        if state.abandoned {
            return;
        }

        let now = Instant::now();

        if now >= state.deadline {
            state.fired = true;
            let waker = state.waker.take();
            drop(state);

            if let Some(waker) = waker {
                waker.wake();
            }

            return;
        }

        let remaining = state.deadline.saturating_duration_since(now);
        let (guard, _timed_out) = shared
            .wakeup
            .wait_timeout(state, remaining)
            .expect(ERR_POISONED_LOCK);
        state = guard;
    }
}

impl Future for Delay {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);

        if state.fired {
            return Poll::Ready(());
        }

        state.waker = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for Delay {
    fn drop(&mut self) {
        let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);
        state.abandoned = true;
        drop(state);

        self.shared.wakeup.notify_one();
    }
}

impl Debug for Delay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delay")
            .field("is_elapsed", &self.is_elapsed())
            .finish()
    }
}

/// Returns a future that completes once `duration` has elapsed.
#[must_use]
pub fn sleep(duration: Duration) -> Delay {
    Delay::new(duration)
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use static_assertions::assert_impl_all;
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(Delay: Send, Sync);

    #[test]
    fn elapses_after_the_duration() {
        with_watchdog(|| {
            let duration = Duration::from_millis(50);
            let start = Instant::now();

            block_on(sleep(duration));

            assert!(start.elapsed() >= duration);
        });
    }

    #[test]
    fn zero_duration_elapses_immediately() {
        with_watchdog(|| {
            block_on(sleep(Duration::ZERO));
        });
    }

    #[test]
    fn is_elapsed_flips_when_the_deadline_passes() {
        with_watchdog(|| {
            let delay = Delay::new(Duration::from_millis(30));

            assert!(!delay.is_elapsed());

            thread::sleep(Duration::from_millis(100));

            assert!(delay.is_elapsed());
        });
    }

    #[test]
    fn dropping_early_releases_the_watcher() {
        with_watchdog(|| {
            let delay = Delay::new(Duration::from_secs(60));
            drop(delay);
            // Nothing to assert: the watchdog catches a stuck watcher only
            // indirectly, but the drop must at least not block.
        });
    }
}
