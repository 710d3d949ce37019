//! Single-threaded publish/subscribe event dispatch.
//!
//! An [`EventEmitter<T>`] is the owner side of an event: it holds the
//! subscriber collection and the capability to [`dispatch`][EventEmitter::dispatch].
//! An [`EventSource<T>`] is the view it hands out: subscribe-only, so that
//! only the owner may emit.
//!
//! Dispatch visits a snapshot of the subscribers taken when the call begins:
//!
//! - every handler subscribed before the dispatch fires exactly once;
//! - a handler subscribed *during* the dispatch first fires on the next one;
//! - a handler unsubscribed during the dispatch does not fire if it has not
//!   fired yet;
//! - a once-subscription is removed immediately before its first invocation
//!   and never fires again.
//!
//! Subscribing returns a [`Disposer`][disposables::Disposer] that removes the
//! subscription; dropping it without disposing leaves the subscription alive.
//!
//! All types in this crate are single-threaded (`!Send`, `!Sync`).
//!
//! # Example
//!
//! ```rust
//! use emitters::EventEmitter;
//!
//! let emitter = EventEmitter::<String>::new();
//!
//! let subscription = emitter.subscribe(|message: &String| {
//!     println!("observed: {message}");
//! });
//!
//! emitter.dispatch(&"hello".to_string());
//!
//! subscription.dispose();
//! emitter.dispatch(&"nobody listens to this".to_string());
//! ```
//!
//! The crate also provides [`ObservableValue<T>`], a value container that
//! broadcasts `{new_value, old_value}` changes through the same mechanism.

mod emitter;
mod observable;

pub use emitter::*;
pub use observable::*;
