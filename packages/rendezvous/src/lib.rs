//! Externally settled futures and rendezvous queues for cooperative code.
//!
//! A [`Deferred<T>`] is a single-settlement future with the settlement
//! capabilities held outside: whoever owns a handle may
//! [`resolve`][Deferred::resolve] or [`reject`][Deferred::reject] it, exactly
//! one of which is ever honored, and any number of waiters may await the
//! outcome. [`Barrier<T>`] is the same contract under gate vocabulary
//! (`unlock` / `wait`). [`ProducerConsumer<T>`] composes deferreds into an
//! unbounded FIFO queue that matches producers and consumers in arrival
//! order, whichever side shows up first.
//!
//! These types are single-threaded (`!Send`, `!Sync`). For settlement that
//! must cross a thread boundary - a timer thread unlocking a gate, say -
//! use the [`SharedDeferred<T>`] / [`SharedBarrier<T>`] siblings, which
//! trade `Rc` and `Cell` for `Arc` and `Mutex` but keep the same contract.
//!
//! # Example
//!
//! ```rust
//! use rendezvous::{Deferred, DeferredState};
//!
//! let deferred = Deferred::<u32>::new();
//! assert_eq!(deferred.state(), DeferredState::Pending);
//!
//! let wait = deferred.wait();
//! deferred.resolve(42);
//!
//! assert_eq!(deferred.state(), DeferredState::Resolved);
//! assert_eq!(futures::executor::block_on(wait), Ok(42));
//! ```

mod barrier;
mod deferred;
mod queue;
mod rejection;
mod shared;

pub use barrier::*;
pub use deferred::*;
pub use queue::*;
pub use rejection::*;
pub use shared::*;
