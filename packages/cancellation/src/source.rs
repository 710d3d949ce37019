use std::cell::{Cell, RefCell};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use disposables::Disposer;
use emitters::EventEmitter;

use crate::CancellationToken;

/// The state shared between a source and the tokens derived from it.
///
/// This is the entire surface a token can reach: the flag, the reason, and
/// the transition signal. The dispatch capability stays with the source.
#[derive(Debug)]
pub(crate) struct CancelState {
    cancelled: Cell<bool>,
    reason: RefCell<Option<String>>,
    signal: EventEmitter<()>,
}

impl CancelState {
    fn new() -> Self {
        Self {
            cancelled: Cell::new(false),
            reason: RefCell::new(None),
            signal: EventEmitter::new(),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    pub(crate) fn reason(&self) -> Option<String> {
        self.reason.borrow().clone()
    }

    /// Flips active -> cancelled and broadcasts the transition.
    ///
    /// Returns `false` without doing anything if already cancelled.
    pub(crate) fn cancel(&self, reason: Option<String>) -> bool {
        if self.cancelled.get() {
            return false;
        }

        self.cancelled.set(true);
        *self.reason.borrow_mut() = reason;

        self.signal.dispatch(&());

        true
    }

    pub(crate) fn subscribe_once<F>(&self, handler: F) -> Disposer
    where
        F: FnMut(&()) + 'static,
    {
        self.signal.subscribe_once(handler)
    }
}

/// The owner of a one-shot cancellation signal.
///
/// Hand the [`token`][Self::token] to the operations that should observe
/// cancellation; keep the source wherever the decision to cancel is made.
///
/// The active -> cancelled transition happens at most once. [`cancel`][Self::cancel]
/// on an already-cancelled source is a programming error and panics;
/// [`try_cancel`][Self::try_cancel] is the checked variant for callers to whom
/// "already cancelled" is an ordinary outcome.
///
/// # Example
///
/// ```rust
/// use cancellation::CancellationTokenSource;
///
/// let source = CancellationTokenSource::new();
/// let token = source.token();
///
/// assert!(!token.is_cancelled());
///
/// source.cancel_with_reason("user pressed abort");
///
/// assert!(token.is_cancelled());
/// assert_eq!(token.reason().as_deref(), Some("user pressed abort"));
/// ```
pub struct CancellationTokenSource {
    state: Rc<CancelState>,
}

impl CancellationTokenSource {
    /// Creates an active (not yet cancelled) source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(CancelState::new()),
        }
    }

    /// Cancels, waking every registered observer.
    ///
    /// # Panics
    ///
    /// Panics if the source is already cancelled; cancellation is a one-shot
    /// event, and signalling it twice is a bug in the caller.
    pub fn cancel(&self) {
        assert!(
            self.state.cancel(None),
            "CancellationTokenSource is already cancelled"
        );
    }

    /// Cancels with a reason, waking every registered observer.
    ///
    /// The reason travels with the token: [`CancellationToken::reason`] and
    /// the [`CancellationError`][crate::CancellationError]s produced by the
    /// race combinators all carry it.
    ///
    /// # Panics
    ///
    /// Panics if the source is already cancelled, as with [`cancel`][Self::cancel].
    pub fn cancel_with_reason(&self, reason: impl Into<String>) {
        assert!(
            self.state.cancel(Some(reason.into())),
            "CancellationTokenSource is already cancelled"
        );
    }

    /// Cancels unless already cancelled.
    ///
    /// Returns whether this call performed the transition.
    pub fn try_cancel(&self) -> bool {
        self.state.cancel(None)
    }

    /// Whether the source has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// The reason given at cancellation, if any yet.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.state.reason()
    }

    /// Derives a read-only token observing this source.
    ///
    /// Any number of tokens may observe one source; they carry no cancel
    /// capability.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken::bound(Rc::clone(&self.state))
    }

    /// Returns a disposer that cancels this source when disposed.
    ///
    /// Disposal is idempotent cleanup, so it cancels through the checked
    /// path: if the source was already cancelled by hand, disposing is a
    /// no-op rather than a double-cancel panic.
    #[must_use]
    pub fn as_disposer(&self) -> Disposer {
        let state = Rc::clone(&self.state);

        Disposer::new(move || {
            state.cancel(None);
        })
    }
}

impl Default for CancellationTokenSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CancellationTokenSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationTokenSource")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(CancellationTokenSource: Send, Sync);

    #[test]
    fn starts_active() {
        let source = CancellationTokenSource::new();

        assert!(!source.is_cancelled());
        assert_eq!(source.reason(), None);
    }

    #[test]
    fn cancel_flips_the_flag_forever() {
        let source = CancellationTokenSource::new();

        source.cancel();

        assert!(source.is_cancelled());
    }

    #[test]
    #[should_panic(expected = "already cancelled")]
    fn second_cancel_panics() {
        let source = CancellationTokenSource::new();

        source.cancel();
        source.cancel();
    }

    #[test]
    #[should_panic(expected = "already cancelled")]
    fn cancel_with_reason_after_cancel_panics() {
        let source = CancellationTokenSource::new();

        source.cancel();
        source.cancel_with_reason("again");
    }

    #[test]
    fn try_cancel_reports_whether_it_transitioned() {
        let source = CancellationTokenSource::new();

        assert!(source.try_cancel());
        assert!(!source.try_cancel());
        assert!(source.is_cancelled());
    }

    #[test]
    fn reason_is_recorded() {
        let source = CancellationTokenSource::new();

        source.cancel_with_reason("deadline passed");

        assert_eq!(source.reason().as_deref(), Some("deadline passed"));
    }

    #[test]
    fn disposer_cancels_the_source() {
        let source = CancellationTokenSource::new();
        let disposer = source.as_disposer();

        disposer.dispose();

        assert!(source.is_cancelled());
    }

    #[test]
    fn disposer_after_manual_cancel_is_a_no_op() {
        let source = CancellationTokenSource::new();
        let disposer = source.as_disposer();

        source.cancel();
        disposer.dispose();

        assert!(source.is_cancelled());
    }
}
