use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};
use std::future::Future;
use std::pin::{Pin, pin};
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use disposables::Disposer;
use futures::future::{Either, select};

use crate::source::CancelState;
use crate::CancellationError;

/// The outcome of racing a future against cancellation.
///
/// Returned by [`CancellationToken::resolve_on_cancel`]: exactly one of the
/// two variants is ever delivered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CancellableResult<T> {
    /// The raced future settled first; its output is carried verbatim.
    Completed(T),

    /// Cancellation won the race; the raced future was abandoned.
    Cancelled,
}

impl<T> CancellableResult<T> {
    /// Whether cancellation won the race.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The raced future's output, or [`None`] if cancellation won.
    #[must_use]
    pub fn into_completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

enum TokenInner {
    /// Observes a live source.
    Bound(Rc<CancelState>),

    /// The explicit "no cancellation" token: never cancelled, registers
    /// nothing, races never won by the cancel side.
    None,
}

/// A read-only view of a [`CancellationTokenSource`][crate::CancellationTokenSource].
///
/// The token observes exactly one source: it can read the flag, register
/// one-shot callbacks for the transition, and race pending futures against
/// it. It cannot cancel.
///
/// [`CancellationToken::none`] is the explicit "this operation is not
/// cancellable" token to pass where a token is required but no source
/// exists.
///
/// # Example
///
/// ```rust
/// use cancellation::CancellationTokenSource;
///
/// let source = CancellationTokenSource::new();
/// let token = source.token();
///
/// token.on_cancel(|| println!("cancelled!"));
///
/// source.cancel(); // prints "cancelled!"
/// ```
pub struct CancellationToken {
    inner: TokenInner,
}

impl CancellationToken {
    pub(crate) fn bound(state: Rc<CancelState>) -> Self {
        Self {
            inner: TokenInner::Bound(state),
        }
    }

    /// The token for operations that cannot be cancelled.
    ///
    /// It is never cancelled, [`on_cancel`][Self::on_cancel] registers
    /// nothing and returns an inert disposer, and the race combinators
    /// simply await the raced future.
    #[must_use]
    pub fn none() -> Self {
        Self {
            inner: TokenInner::None,
        }
    }

    /// Whether the observed source has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match &self.inner {
            TokenInner::Bound(state) => state.is_cancelled(),
            TokenInner::None => false,
        }
    }

    /// The reason given at cancellation, if any yet.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match &self.inner {
            TokenInner::Bound(state) => state.reason(),
            TokenInner::None => None,
        }
    }

    /// Fails with a [`CancellationError`] if the source has cancelled.
    ///
    /// The synchronous assertion for cancellation-aware loops: call it at
    /// natural checkpoints and propagate the error with `?`.
    pub fn check(&self) -> Result<(), CancellationError> {
        if self.is_cancelled() {
            return Err(CancellationError::new(self.reason()));
        }

        Ok(())
    }

    /// Registers a callback for the cancel transition.
    ///
    /// If the source has already cancelled, the callback is invoked
    /// synchronously - in this very call - and an inert disposer is
    /// returned. Otherwise the callback fires exactly once when the source
    /// cancels, and the returned disposer unsubscribes it early.
    pub fn on_cancel<F>(&self, handler: F) -> Disposer
    where
        F: FnOnce() + 'static,
    {
        match &self.inner {
            TokenInner::None => Disposer::empty(),
            TokenInner::Bound(state) => {
                if state.is_cancelled() {
                    handler();
                    return Disposer::empty();
                }

                // The signal is FnMut-shaped; the FnOnce rides in an Option.
                let mut handler = Some(handler);
                state.subscribe_once(move |_: &()| {
                    if let Some(handler) = handler.take() {
                        handler();
                    }
                })
            }
        }
    }

    /// Returns a future that completes when the source cancels.
    ///
    /// For a [`none`][Self::none] token the future never completes. Dropping
    /// the future releases its registration, so an abandoned wait does not
    /// leak a handler.
    #[must_use]
    pub fn cancelled(&self) -> Cancelled {
        Cancelled {
            token: self.clone(),
            waker_slot: Rc::new(RefCell::new(None)),
            registration: None,
        }
    }

    /// Races `future` against cancellation; whichever settles first wins.
    ///
    /// Returns [`CancellableResult::Cancelled`] if the source cancels before
    /// `future` settles, and [`CancellableResult::Completed`] carrying the
    /// output otherwise - including when that output is itself a failure,
    /// which propagates verbatim. Exactly one of the two is ever delivered,
    /// and the losing side's registration is released.
    ///
    /// A source that is already cancelled when the race starts wins it.
    pub async fn resolve_on_cancel<F>(&self, future: F) -> CancellableResult<F::Output>
    where
        F: Future,
    {
        let cancelled = pin!(self.cancelled());
        let future = pin!(future);

        match select(cancelled, future).await {
            Either::Left(((), _)) => CancellableResult::Cancelled,
            Either::Right((output, _)) => CancellableResult::Completed(output),
        }
    }

    /// Races `future` against cancellation, turning a lost race into a
    /// [`CancellationError`].
    ///
    /// The same race as [`resolve_on_cancel`][Self::resolve_on_cancel], for
    /// callers that propagate cancellation as a failure. The error carries
    /// the source's reason when one was given.
    pub async fn reject_on_cancel<F>(&self, future: F) -> Result<F::Output, CancellationError>
    where
        F: Future,
    {
        match self.resolve_on_cancel(future).await {
            CancellableResult::Completed(output) => Ok(output),
            CancellableResult::Cancelled => Err(CancellationError::new(self.reason())),
        }
    }
}

impl Clone for CancellationToken {
    fn clone(&self) -> Self {
        match &self.inner {
            TokenInner::Bound(state) => Self {
                inner: TokenInner::Bound(Rc::clone(state)),
            },
            TokenInner::None => Self::none(),
        }
    }
}

impl Debug for CancellationToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner {
            TokenInner::Bound(_) => "bound",
            TokenInner::None => "none",
        };

        f.debug_struct("CancellationToken")
            .field("kind", &kind)
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Future returned by [`CancellationToken::cancelled`].
pub struct Cancelled {
    token: CancellationToken,

    /// Shared with the registered callback so every poll can refresh the
    /// waker the callback will wake.
    waker_slot: Rc<RefCell<Option<Waker>>>,

    registration: Option<Disposer>,
}

impl Future for Cancelled {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.token.is_cancelled() {
            return Poll::Ready(());
        }

        *self.waker_slot.borrow_mut() = Some(cx.waker().clone());

        if self.registration.is_none() {
            let slot = Rc::clone(&self.waker_slot);
            let registration = self.token.on_cancel(move || {
                if let Some(waker) = slot.borrow_mut().take() {
                    waker.wake();
                }
            });

            self.registration = Some(registration);
        }

        Poll::Pending
    }
}

impl Drop for Cancelled {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            registration.dispose();
        }
    }
}

impl Debug for Cancelled {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cancelled")
            .field("is_cancelled", &self.token.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use rendezvous::{Deferred, Rejection};
    use static_assertions::assert_not_impl_any;
    use testing::with_watchdog;

    use super::*;
    use crate::CancellationTokenSource;

    assert_not_impl_any!(CancellationToken: Send, Sync);
    assert_not_impl_any!(Cancelled: Send, Sync);

    fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let mut context = Context::from_waker(noop_waker_ref());
        Pin::new(future).poll(&mut context)
    }

    #[test]
    fn token_reflects_source_state() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        assert!(!token.is_cancelled());

        source.cancel();

        assert!(token.is_cancelled());
    }

    #[test]
    fn on_cancel_fires_exactly_once_on_transition() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        let calls = Rc::new(Cell::new(0));
        let calls_in_handler = Rc::clone(&calls);
        token.on_cancel(move || calls_in_handler.set(calls_in_handler.get() + 1));

        assert_eq!(calls.get(), 0);

        source.cancel();

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn on_cancel_after_cancellation_fires_synchronously() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        source.cancel();

        let fired = Rc::new(Cell::new(false));
        let fired_in_handler = Rc::clone(&fired);
        let registration = token.on_cancel(move || fired_in_handler.set(true));

        // Fired in the same turn, not deferred to some later transition.
        assert!(fired.get());
        assert!(registration.is_disposed());
    }

    #[test]
    fn disposed_registration_does_not_fire() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        let fired = Rc::new(Cell::new(false));
        let fired_in_handler = Rc::clone(&fired);
        let registration = token.on_cancel(move || fired_in_handler.set(true));

        registration.dispose();
        source.cancel();

        assert!(!fired.get());
    }

    #[test]
    fn check_turns_cancellation_into_an_error() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        assert!(token.check().is_ok());

        source.cancel_with_reason("deadline");

        let error = token.check().expect_err("source is cancelled");
        assert_eq!(error.reason(), Some("deadline"));
    }

    #[test]
    fn none_token_never_cancels() {
        let token = CancellationToken::none();

        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        let registration = token.on_cancel(|| panic!("must never fire"));
        assert!(registration.is_disposed());
    }

    #[test]
    fn cancelled_future_completes_on_cancel() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let mut cancelled = cancelled_boxed(&token);
            assert!(poll_once(&mut cancelled).is_pending());

            source.cancel();

            block_on(cancelled);
        });
    }

    #[test]
    fn dropping_cancelled_future_releases_registration() {
        let source = CancellationTokenSource::new();
        let token = source.token();

        let mut cancelled = cancelled_boxed(&token);
        assert!(poll_once(&mut cancelled).is_pending());
        drop(cancelled);

        // The registration is gone; cancelling finds nobody to wake.
        source.cancel();
    }

    #[test]
    fn resolve_on_cancel_completes_when_future_wins() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let race = token.resolve_on_cancel(operation.wait());

            operation.resolve(5);

            assert_eq!(
                block_on(race),
                CancellableResult::Completed(Ok(5))
            );
        });
    }

    #[test]
    fn resolve_on_cancel_cancels_when_cancel_wins() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let mut race = Box::pin(token.resolve_on_cancel(operation.wait()));

            assert!(poll_once(&mut race).is_pending());

            source.cancel();

            assert_eq!(block_on(race), CancellableResult::Cancelled);
        });
    }

    #[test]
    fn already_cancelled_source_wins_the_race_immediately() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            source.cancel();

            // Even a future that is ready loses to a cancel that came first.
            let outcome = block_on(token.resolve_on_cancel(async { 1 }));

            assert_eq!(outcome, CancellableResult::Cancelled);
        });
    }

    #[test]
    fn failure_of_the_raced_future_propagates_verbatim() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let race = token.resolve_on_cancel(operation.wait());

            operation.reject("backend exploded");

            assert_eq!(
                block_on(race),
                CancellableResult::Completed(Err(Rejection::new("backend exploded")))
            );
        });
    }

    #[test]
    fn exactly_one_outcome_is_delivered() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let race = token.resolve_on_cancel(operation.wait());

            operation.resolve(5);
            let outcome = block_on(race);
            assert_eq!(outcome, CancellableResult::Completed(Ok(5)));

            // The cancel side of the settled race is disabled: cancelling now
            // affects nothing and panics nowhere.
            source.cancel();
        });
    }

    #[test]
    fn reject_on_cancel_passes_the_output_through() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let race = token.reject_on_cancel(operation.wait());

            operation.resolve(9);

            assert_eq!(block_on(race), Ok(Ok(9)));
        });
    }

    #[test]
    fn reject_on_cancel_fails_with_the_reason() {
        with_watchdog(|| {
            let source = CancellationTokenSource::new();
            let token = source.token();

            let operation = Deferred::<u32>::new();
            let mut race = Box::pin(token.reject_on_cancel(operation.wait()));

            assert!(poll_once(&mut race).is_pending());

            source.cancel_with_reason("user aborted");

            let error = block_on(race).expect_err("cancellation won");
            assert_eq!(error.reason(), Some("user aborted"));
        });
    }

    #[test]
    fn none_token_races_always_complete() {
        with_watchdog(|| {
            let token = CancellationToken::none();

            let outcome = block_on(token.resolve_on_cancel(async { "done" }));

            assert_eq!(outcome, CancellableResult::Completed("done"));
        });
    }

    /// `Cancelled` is `Unpin`, but boxing keeps the test sites uniform with
    /// the `async fn` races, which are not.
    fn cancelled_boxed(token: &CancellationToken) -> Pin<Box<Cancelled>> {
        Box::pin(token.cancelled())
    }
}
