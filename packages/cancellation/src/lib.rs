//! One-shot cancellation propagation for cooperative code.
//!
//! A [`CancellationTokenSource`] owns a monotonic cancelled flag and the
//! capability to flip it - once. The [`CancellationToken`]s it hands out are
//! read-only views: they can observe the flag, register callbacks for the
//! transition, and race pending futures against it, but they can never
//! cancel anything themselves.
//!
//! Cancellation is a one-shot *event*, not a resettable flag: cancelling an
//! already-cancelled source is a programming error and panics. Use
//! [`try_cancel`][CancellationTokenSource::try_cancel] where "already
//! cancelled" is an expected outcome rather than a bug.
//!
//! All types in this crate are single-threaded (`!Send`, `!Sync`).
//!
//! # Example
//!
//! ```rust
//! use cancellation::{CancellableResult, CancellationTokenSource};
//! use futures::executor::block_on;
//! use rendezvous::Deferred;
//!
//! let source = CancellationTokenSource::new();
//! let token = source.token();
//!
//! // A long-running operation, modeled by a deferred nobody will resolve.
//! let operation = Deferred::<u32>::new();
//! let race = token.resolve_on_cancel(operation.wait());
//!
//! source.cancel();
//!
//! assert!(matches!(block_on(race), CancellableResult::Cancelled));
//! ```

mod error;
mod source;
mod token;

pub use error::*;
pub use source::*;
pub use token::*;
