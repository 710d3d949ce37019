//! Explicit resource-release handles for cooperative, event-driven code.
//!
//! This crate provides the disposal half of the Coopkit toolkit: a [`Disposer`]
//! is a handle whose one capability is releasing an associated resource, and a
//! [`DisposableBag`] aggregates many such handles into a group that is released
//! as a unit, exactly once.
//!
//! Disposal here is *explicit*: dropping a [`Disposer`] without calling
//! [`dispose`][Disposer::dispose] leaves the underlying resource alive. This is
//! deliberate - the handles are routinely returned from subscription-style APIs
//! where the caller may not care to ever unsubscribe, and silently releasing on
//! drop would turn every ignored return value into an unsubscription.
//!
//! All types in this crate are single-threaded (`!Send`, `!Sync`).
//!
//! # Example
//!
//! ```rust
//! use disposables::{DisposableBag, Disposer};
//!
//! let bag = DisposableBag::new();
//!
//! bag.track(Disposer::new(|| println!("first resource released")));
//! bag.track(Disposer::new(|| println!("second resource released")));
//!
//! // Releases every tracked member, in insertion order. A second call
//! // is a no-op.
//! bag.dispose();
//! bag.dispose();
//! ```

mod bag;
mod disposer;

pub use bag::*;
pub use disposer::*;
