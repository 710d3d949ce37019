use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex};
use std::task::{Context, Poll};
use std::thread;
use std::time::{Duration, Instant};

use disposables::Disposer;
use rendezvous::{SharedBarrier, SharedWait};

use crate::{ERR_POISONED_LOCK, deadline_after};

#[derive(Debug)]
struct TimeoutShared {
    state: Mutex<TimeoutState>,
    wakeup: Condvar,
}

#[derive(Debug)]
struct TimeoutState {
    deadline: Instant,
    duration: Duration,
    timed_out: bool,
    abandoned: bool,
}

/// A single-shot deadline that can be pushed back while it has not fired.
///
/// Every [`reset`][Self::reset] re-arms the full duration; once the final
/// un-reset deadline fully elapses, [`timed_out`][Self::timed_out] becomes
/// `true` and [`on_timeout`][Self::on_timeout] completes - exactly once,
/// however many resets came before. Resets after firing are no-ops.
///
/// Internally the deadline is a [`SharedBarrier`] unlocked by the watcher
/// thread; dropping the timeout (or disposing its
/// [`canceller`][Self::canceller]) releases the watcher without firing,
/// leaving `on_timeout` futures pending forever.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use timers::ResettableTimeout;
///
/// let timeout = ResettableTimeout::new(Duration::from_millis(50));
///
/// assert!(!timeout.timed_out());
/// timeout.reset(); // start the 50ms over
///
/// futures::executor::block_on(timeout.on_timeout());
/// assert!(timeout.timed_out());
/// ```
pub struct ResettableTimeout {
    shared: Arc<TimeoutShared>,
    gate: SharedBarrier<()>,
}

impl ResettableTimeout {
    /// Arms a deadline `duration` from now.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        let shared = Arc::new(TimeoutShared {
            state: Mutex::new(TimeoutState {
                deadline: deadline_after(duration),
                duration,
                timed_out: false,
                abandoned: false,
            }),
            wakeup: Condvar::new(),
        });
        let gate = SharedBarrier::new();

        let watcher_shared = Arc::clone(&shared);
        let watcher_gate = gate.clone();
        thread::spawn(move || timeout_watcher(&watcher_shared, &watcher_gate));

        Self { shared, gate }
    }

    /// Pushes the deadline back to one full duration from now.
    ///
    /// A no-op once the timeout has fired or been cancelled.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);

        if state.timed_out || state.abandoned {
            return;
        }

        state.deadline = deadline_after(state.duration);
        drop(state);

        self.shared.wakeup.notify_one();
    }

    /// Pushes the deadline back to `duration` from now; later
    /// [`reset`][Self::reset] calls re-arm this new duration.
    ///
    /// A no-op once the timeout has fired or been cancelled.
    pub fn reset_to(&self, duration: Duration) {
        let mut state = self.shared.state.lock().expect(ERR_POISONED_LOCK);

        if state.timed_out || state.abandoned {
            return;
        }

        state.duration = duration;
        state.deadline = deadline_after(duration);
        drop(state);

        self.shared.wakeup.notify_one();
    }

    /// Whether the deadline has fired.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.shared.state.lock().expect(ERR_POISONED_LOCK).timed_out
    }

    /// Returns a future that completes when the deadline fires.
    ///
    /// Any number of waits may be outstanding; they all complete on the one
    /// firing. If the timeout is cancelled instead, they stay pending
    /// forever.
    #[must_use]
    pub fn on_timeout(&self) -> OnTimeout {
        OnTimeout {
            wait: self.gate.wait(),
        }
    }

    /// Returns a disposer that cancels the timeout, for tracking in a
    /// [`DisposableBag`][disposables::DisposableBag].
    ///
    /// Cancelling releases the watcher without firing. Dropping the
    /// `ResettableTimeout` itself has the same effect.
    #[must_use]
    pub fn canceller(&self) -> Disposer {
        let shared = Arc::clone(&self.shared);

        Disposer::new(move || abandon(&shared))
    }
}

fn abandon(shared: &TimeoutShared) {
    let mut state = shared.state.lock().expect(ERR_POISONED_LOCK);
    state.abandoned = true;
    drop(state);

    shared.wakeup.notify_one();
}

fn timeout_watcher(shared: &TimeoutShared, gate: &SharedBarrier<()>) {
    let mut state = shared.state.lock().expect(ERR_POISONED_LOCK);

    loop {
        if state.abandoned {
            return;
        }

        let now = Instant::now();

        if now >= state.deadline {
            state.timed_out = true;
            drop(state);

            gate.unlock(());
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

impl Drop for ResettableTimeout {
    fn drop(&mut self) {
        abandon(&self.shared);
    }
}

impl Debug for ResettableTimeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResettableTimeout")
            .field("timed_out", &self.timed_out())
            .finish()
    }
}

/// Future returned by [`ResettableTimeout::on_timeout`].
pub struct OnTimeout {
    wait: SharedWait<()>,
}

impl Future for OnTimeout {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // The gate is only ever unlocked, never rejected.
        match Pin::new(&mut self.wait).poll(cx) {
            Poll::Ready(_) => Poll::Ready(()),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Debug for OnTimeout {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnTimeout").finish_non_exhaustive()
    }
}
