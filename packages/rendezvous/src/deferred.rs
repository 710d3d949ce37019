use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::Rejection;

/// The observable lifecycle of a [`Deferred`] or [`Barrier`][crate::Barrier].
///
/// The state is monotonic: it leaves `Pending` at most once and never
/// changes again. It exists for code that wants to peek at a settlement
/// without attaching a waiter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeferredState {
    /// Not yet settled.
    Pending,

    /// Settled with a value.
    Resolved,

    /// Settled with a [`Rejection`].
    Rejected,
}

struct Inner<T> {
    state: Cell<DeferredState>,

    /// Present from settlement onwards, except after the crate-internal
    /// consuming receive has moved the value out.
    settlement: RefCell<Option<Result<T, Rejection>>>,

    /// Waiters parked before settlement, woken in registration order.
    wakers: RefCell<Vec<Waker>>,
}

impl<T> Inner<T> {
    fn settle(&self, outcome: Result<T, Rejection>, state: DeferredState) {
        // First settlement wins; everything after it is an observable no-op.
        if self.state.get() != DeferredState::Pending {
            return;
        }

        self.state.set(state);
        *self.settlement.borrow_mut() = Some(outcome);

        for waker in self.wakers.borrow_mut().drain(..) {
            waker.wake();
        }
    }
}

/// A single-settlement future with the settlement capabilities held outside.
///
/// Cloning a `Deferred` clones the *handle*: every clone addresses the same
/// settlement cell, so one side of a protocol can hold the resolve/reject
/// capability while another awaits [`wait`][Self::wait].
///
/// Exactly one settlement is honored. The first `resolve` or `reject` call
/// fixes the [`state`][Self::state] forever; later settlement calls are
/// no-ops.
///
/// # Example
///
/// ```rust
/// use rendezvous::Deferred;
///
/// let deferred = Deferred::<String>::new();
/// let wait = deferred.wait();
///
/// deferred.resolve("ready".to_string());
/// deferred.reject("too late"); // no-op: already resolved
///
/// let outcome = futures::executor::block_on(wait);
/// assert_eq!(outcome, Ok("ready".to_string()));
/// ```
pub struct Deferred<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Deferred<T> {
    /// Creates a pending deferred.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                state: Cell::new(DeferredState::Pending),
                settlement: RefCell::new(None),
                wakers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Settles with a value, waking every waiter.
    ///
    /// A no-op if already settled.
    pub fn resolve(&self, value: T) {
        self.inner.settle(Ok(value), DeferredState::Resolved);
    }

    /// Settles with a failure, waking every waiter.
    ///
    /// A no-op if already settled.
    pub fn reject(&self, reason: impl Into<Rejection>) {
        self.inner
            .settle(Err(reason.into()), DeferredState::Rejected);
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DeferredState {
        self.inner.state.get()
    }

    /// Returns a future that yields the settlement.
    ///
    /// Any number of waiters may be outstanding at once; on settlement they
    /// are woken in the order they first polled, each receiving its own
    /// clone of the outcome.
    #[must_use]
    pub fn wait(&self) -> Wait<T> {
        Wait {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Returns a future that yields the settlement by moving it out.
    ///
    /// Exactly one such future may be created per deferred; the rendezvous
    /// queue relies on this to hand each queued value to exactly one
    /// consumer without a `Clone` bound.
    pub(crate) fn take(&self) -> Take<T> {
        Take {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Debug for Deferred<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.state())
            .finish()
    }
}

/// Future returned by [`Deferred::wait`].
pub struct Wait<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Future for Wait<T>
where
    T: Clone,
{
    type Output = Result<T, Rejection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.inner.state.get() == DeferredState::Pending {
            // Pushed once per poll; a spurious extra wake is harmless.
            self.inner.wakers.borrow_mut().push(cx.waker().clone());
            return Poll::Pending;
        }

        let settlement = self.inner.settlement.borrow();

        match settlement.as_ref() {
            Some(outcome) => Poll::Ready(outcome.clone()),
            None => panic!("deferred value was already consumed"),
        }
    }
}

impl<T> Debug for Wait<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("state", &self.inner.state.get())
            .finish()
    }
}

/// Crate-internal consuming variant of [`Wait`]; see [`Deferred::take`].
pub(crate) struct Take<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Future for Take<T> {
    type Output = Result<T, Rejection>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.inner.state.get() == DeferredState::Pending {
            self.inner.wakers.borrow_mut().push(cx.waker().clone());
            return Poll::Pending;
        }

        let outcome = self
            .inner
            .settlement
            .borrow_mut()
            .take()
            .expect("settlement is present: the queue hands each deferred to one consumer");

        Poll::Ready(outcome)
    }
}

impl<T> Debug for Take<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Take")
            .field("state", &self.inner.state.get())
            .finish()
    }
}
