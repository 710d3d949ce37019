use std::fmt::{self, Debug, Formatter};

use crate::{Deferred, DeferredState, Rejection, Wait};

/// A one-shot gate: a [`Deferred`] under unlocking vocabulary.
///
/// Exactly the [`Deferred`] contract - single settlement, monotonic state,
/// any number of waiters - renamed for callers that think in terms of
/// "unlock this gate" rather than "resolve this value".
///
/// # Example
///
/// ```rust
/// use rendezvous::Barrier;
///
/// let gate = Barrier::<u32>::new();
/// let wait = gate.wait();
///
/// gate.unlock(99);
///
/// assert!(gate.is_unlocked());
/// assert_eq!(futures::executor::block_on(wait), Ok(99));
/// ```
pub struct Barrier<T> {
    deferred: Deferred<T>,
}

impl<T> Barrier<T> {
    /// Creates a locked barrier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deferred: Deferred::new(),
        }
    }

    /// Unlocks the barrier with a value, waking every waiter.
    ///
    /// A no-op if the barrier is already unlocked or rejected.
    pub fn unlock(&self, value: T) {
        self.deferred.resolve(value);
    }

    /// Fails the barrier, waking every waiter with the reason.
    ///
    /// A no-op if the barrier is already unlocked or rejected.
    pub fn reject(&self, reason: impl Into<Rejection>) {
        self.deferred.reject(reason);
    }

    /// Whether the barrier has been unlocked with a value.
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.deferred.state() == DeferredState::Resolved
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeferredState {
        self.deferred.state()
    }

    /// Returns a future that completes when the barrier settles.
    #[must_use]
    pub fn wait(&self) -> Wait<T> {
        self.deferred.wait()
    }
}

impl<T> Clone for Barrier<T> {
    fn clone(&self) -> Self {
        Self {
            deferred: self.deferred.clone(),
        }
    }
}

impl<T> Default for Barrier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Barrier<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Barrier")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;
    use testing::with_watchdog;

    use super::*;

    assert_not_impl_any!(Barrier<u32>: Send, Sync);

    #[test]
    fn starts_locked() {
        let gate = Barrier::<u32>::new();

        assert!(!gate.is_unlocked());
        assert_eq!(gate.state(), DeferredState::Pending);
    }

    #[test]
    fn unlock_releases_waiters() {
        with_watchdog(|| {
            let gate = Barrier::<&'static str>::new();
            let wait = gate.wait();

            gate.unlock("open");

            assert!(gate.is_unlocked());
            assert_eq!(futures::executor::block_on(wait), Ok("open"));
        });
    }

    #[test]
    fn reject_fails_waiters_without_unlocking() {
        with_watchdog(|| {
            let gate = Barrier::<u32>::new();
            let wait = gate.wait();

            gate.reject("torn down");

            assert!(!gate.is_unlocked());
            assert_eq!(gate.state(), DeferredState::Rejected);
            assert_eq!(
                futures::executor::block_on(wait),
                Err(Rejection::new("torn down"))
            );
        });
    }

    #[test]
    fn second_unlock_is_a_no_op() {
        with_watchdog(|| {
            let gate = Barrier::<u32>::new();

            gate.unlock(1);
            gate.unlock(2);

            assert_eq!(futures::executor::block_on(gate.wait()), Ok(1));
        });
    }
}
