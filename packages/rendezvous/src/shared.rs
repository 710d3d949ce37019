use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::{DeferredState, Rejection};

pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock";

struct SharedInner<T> {
    state: DeferredState,
    settlement: Option<Result<T, Rejection>>,
    wakers: Vec<Waker>,
}

/// The thread-safe sibling of [`Deferred`][crate::Deferred].
///
/// Same contract - single settlement, monotonic observable state, any number
/// of waiters - but the handle may be cloned across threads and settled from
/// any of them. Use it where the settling side lives on another thread, such
/// as a timer thread unlocking a gate the owning thread awaits.
///
/// # Example
///
/// ```rust
/// use rendezvous::SharedDeferred;
///
/// let deferred = SharedDeferred::<u32>::new();
///
/// let handle = deferred.clone();
/// std::thread::spawn(move || handle.resolve(42))
///     .join()
///     .unwrap();
///
/// assert_eq!(futures::executor::block_on(deferred.wait()), Ok(42));
/// ```
pub struct SharedDeferred<T> {
    inner: Arc<Mutex<SharedInner<T>>>,
}

impl<T> SharedDeferred<T> {
    /// Creates a pending deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SharedInner {
                state: DeferredState::Pending,
                settlement: None,
                wakers: Vec::new(),
            })),
        }
    }

    /// Settles with a value, waking every waiter.
    ///
    /// A no-op if already settled.
    pub fn resolve(&self, value: T) {
        self.settle(Ok(value), DeferredState::Resolved);
    }

    /// Settles with a failure, waking every waiter.
    ///
    /// A no-op if already settled.
    pub fn reject(&self, reason: impl Into<Rejection>) {
        self.settle(Err(reason.into()), DeferredState::Rejected);
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeferredState {
        self.inner.lock().expect(ERR_POISONED_LOCK).state
    }

    /// Returns a future that yields the settlement.
    ///
    /// See [`Deferred::wait`][crate::Deferred::wait]; the contract is the
    /// same.
    #[must_use]
    pub fn wait(&self) -> SharedWait<T> {
        SharedWait {
            inner: Arc::clone(&self.inner),
        }
    }

    fn settle(&self, outcome: Result<T, Rejection>, state: DeferredState) {
        let woken = {
            let mut inner = self.inner.lock().expect(ERR_POISONED_LOCK);

            // First settlement wins, as with the single-threaded variant.
            if inner.state != DeferredState::Pending {
                return;
            }

            inner.state = state;
            inner.settlement = Some(outcome);
            std::mem::take(&mut inner.wakers)
        };

        // Woken outside the lock: a waker may run arbitrary executor code.
        for waker in woken {
            waker.wake();
        }
    }
}

impl<T> Clone for SharedDeferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedDeferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for SharedDeferred<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDeferred")
            .field("state", &self.state())
            .finish()
    }
}

/// Future returned by [`SharedDeferred::wait`].
pub struct SharedWait<T> {
    inner: Arc<Mutex<SharedInner<T>>>,
}

impl<T> Future for SharedWait<T>
where
    T: Clone,
{
    type Output = Result<T, Rejection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.inner.lock().expect(ERR_POISONED_LOCK);

        if inner.state == DeferredState::Pending {
            inner.wakers.push(cx.waker().clone());
            return Poll::Pending;
        }

        match inner.settlement.as_ref() {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => panic!("shared deferred settlement is missing"),
        }
    }
}

impl<T> Debug for SharedWait<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWait").finish_non_exhaustive()
    }
}

/// The thread-safe sibling of [`Barrier`][crate::Barrier].
///
/// A [`SharedDeferred`] under unlocking vocabulary; settle-from-any-thread,
/// await-from-the-owner.
pub struct SharedBarrier<T> {
    deferred: SharedDeferred<T>,
}

impl<T> SharedBarrier<T> {
    /// Creates a locked barrier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deferred: SharedDeferred::new(),
        }
    }

    /// Unlocks the barrier with a value, waking every waiter.
    ///
    /// A no-op if the barrier is already settled.
    pub fn unlock(&self, value: T) {
        self.deferred.resolve(value);
    }

    /// Fails the barrier, waking every waiter with the reason.
    ///
    /// A no-op if the barrier is already settled.
    pub fn reject(&self, reason: impl Into<Rejection>) {
        self.deferred.reject(reason);
    }

    /// Whether the barrier has been unlocked with a value.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.deferred.state() == DeferredState::Resolved
    }

    /// Returns a future that completes when the barrier settles.
    #[must_use]
    pub fn wait(&self) -> SharedWait<T> {
        self.deferred.wait()
    }
}

impl<T> Clone for SharedBarrier<T> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
        }
    }
}

impl<T> Default for SharedBarrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for SharedBarrier<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBarrier")
            .field("state", &self.deferred.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use futures::executor::block_on;
    use static_assertions::assert_impl_all;
    use testing::with_watchdog;

    use super::*;

    assert_impl_all!(SharedDeferred<u32>: Send, Sync);
    assert_impl_all!(SharedBarrier<u32>: Send, Sync);

    #[test]
    fn settles_across_threads() {
        with_watchdog(|| {
            let deferred = SharedDeferred::<u32>::new();

            let handle = deferred.clone();
            let worker = thread::spawn(move || handle.resolve(42));

            let outcome = block_on(deferred.wait());
            worker.join().expect("worker does not panic");

            assert_eq!(outcome, Ok(42));
        });
    }

    #[test]
    fn first_settlement_wins_across_threads() {
        with_watchdog(|| {
            let deferred = SharedDeferred::<u32>::new();

            deferred.resolve(1);

            let handle = deferred.clone();
            thread::spawn(move || handle.reject("late"))
                .join()
                .expect("worker does not panic");

            assert_eq!(deferred.state(), DeferredState::Resolved);
            assert_eq!(block_on(deferred.wait()), Ok(1));
        });
    }

    #[test]
    fn shared_barrier_unlocks_from_another_thread() {
        with_watchdog(|| {
            let gate = SharedBarrier::<&'static str>::new();

            let handle = gate.clone();
            thread::spawn(move || handle.unlock("open"))
                .join()
                .expect("worker does not panic");

            assert!(gate.is_unlocked());
            assert_eq!(block_on(gate.wait()), Ok("open"));
        });
    }
}
