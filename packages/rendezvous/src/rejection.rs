use thiserror::Error;

/// The reason a settlement failed, delivered verbatim to every waiter.
///
/// Carried by [`Deferred::reject`][crate::Deferred::reject] and its
/// relatives; the toolkit never wraps or rewrites it.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{reason}")]
pub struct Rejection {
    reason: String,
}

impl Rejection {
    /// Creates a rejection carrying `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The caller-supplied reason, unchanged.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<&str> for Rejection {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for Rejection {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}
