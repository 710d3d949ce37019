use std::cell::RefCell;
use std::fmt::{self, Debug, Formatter};

/// A handle whose sole capability is releasing an associated resource.
///
/// The release callback runs at most once: the first call to
/// [`dispose`][Self::dispose] consumes it, and every later call is a no-op.
///
/// Dropping a `Disposer` without calling `dispose` does **not** run the
/// callback. The resource stays alive until someone explicitly releases it;
/// see the crate-level documentation for why.
///
/// # Example
///
/// ```rust
/// use disposables::Disposer;
///
/// let disposer = Disposer::new(|| println!("released"));
///
/// disposer.dispose(); // prints "released"
/// disposer.dispose(); // no-op
/// ```
pub struct Disposer {
    /// `None` once disposed. `RefCell` because disposal takes the callback
    /// out through a shared reference.
    callback: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Disposer {
    /// Creates a disposer that runs `callback` on the first [`dispose`][Self::dispose] call.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            callback: RefCell::new(Some(Box::new(callback))),
        }
    }

    /// Creates a disposer that does nothing when disposed.
    ///
    /// Useful as the return value of subscription APIs that have nothing to
    /// unsubscribe, so callers can treat every path uniformly.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            callback: RefCell::new(None),
        }
    }

    /// Releases the associated resource.
    ///
    /// Idempotent: the callback runs on the first call only.
    pub fn dispose(&self) {
        let callback = self.callback.borrow_mut().take();

        if let Some(callback) = callback {
            callback();
        }
    }

    /// Whether the resource has already been released (or there was nothing
    /// to release to begin with).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.callback.borrow().is_none()
    }
}

impl Default for Disposer {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for Disposer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer")
            .field("is_disposed", &self.is_disposed())
            .finish()
    }
}

/// Collects many disposers into one that releases them in iteration order.
impl FromIterator<Disposer> for Disposer {
    fn from_iter<I: IntoIterator<Item = Disposer>>(iter: I) -> Self {
        let members: Vec<Disposer> = iter.into_iter().collect();

        if members.is_empty() {
            return Self::empty();
        }

        Self::new(move || {
            for member in &members {
                member.dispose();
            }
        })
    }
}
