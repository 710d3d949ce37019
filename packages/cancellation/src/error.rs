use std::error::Error;
use std::fmt::{self, Display, Formatter};

/// Signals that an operation was deliberately abandoned via cancellation.
///
/// Distinct from any other failure so callers can tell "the operation was
/// cancelled" apart from "the operation failed". Produced only by
/// [`CancellationToken::check`][crate::CancellationToken::check] and
/// [`CancellationToken::reject_on_cancel`][crate::CancellationToken::reject_on_cancel];
/// nothing in the toolkit raises it implicitly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CancellationError {
    reason: Option<String>,
}

impl CancellationError {
    pub(crate) fn new(reason: Option<String>) -> Self {
        Self { reason }
    }

    /// The reason given to the cancelling call, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

impl Error for CancellationError {}

impl Display for CancellationError {
    #[cfg_attr(test, mutants::skip)] // No API contract for error message.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "operation was cancelled: {reason}"),
            None => write!(f, "operation was cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(CancellationError: Clone, Debug, Send, Sync);

    #[test]
    fn carries_the_reason_when_given() {
        let error = CancellationError::new(Some("shutdown".to_string()));

        assert_eq!(error.reason(), Some("shutdown"));
    }

    #[test]
    fn reason_is_optional() {
        let error = CancellationError::new(None);

        assert_eq!(error.reason(), None);
    }
}
