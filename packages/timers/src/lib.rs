//! Timers for cooperative code: future-based waits and disposable schedules.
//!
//! The toolkit's core primitives are single-threaded and cooperative; a timer
//! is the one place where something must happen *later* without anyone
//! awaiting it. Each timer here parks a dedicated watcher thread on a condvar
//! until its deadline, then either wakes a waker ([`Delay`],
//! [`ResettableTimeout`]) or runs a callback ([`start_timeout`],
//! [`start_interval`]). The watcher touches only thread-safe state; the
//! public surface stays cooperative - futures to await and
//! [`Disposer`][disposables::Disposer] handles to release.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//!
//! use timers::sleep;
//!
//! futures::executor::block_on(sleep(Duration::from_millis(10)));
//! ```

mod clock;
mod delay;
mod resettable;
mod schedule;

pub(crate) use clock::*;
pub use delay::*;
pub use resettable::*;
pub use schedule::*;
