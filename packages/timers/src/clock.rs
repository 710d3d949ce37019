use std::time::{Duration, Instant};

pub(crate) const ERR_POISONED_LOCK: &str = "encountered poisoned lock";

/// The deadline `duration` from now.
///
/// # Panics
///
/// Panics if the deadline is not representable on the monotonic clock, which
/// takes a duration of centuries.
pub(crate) fn deadline_after(duration: Duration) -> Instant {
    Instant::now()
        .checked_add(duration)
        .expect("timer deadline overflows the monotonic clock")
}
