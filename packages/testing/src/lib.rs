//! Private helpers for testing and examples in Coopkit packages.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// This function wraps a test closure with a timeout mechanism. If the test
/// takes longer than the timeout to complete, the process panics so that
/// CI/build systems do not hang on a stuck synchronization primitive.
///
/// # Panics
///
/// Panics if the test exceeds the timeout.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     // Your test code here
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    // Run the test in a separate thread
    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // Send the result back - if this fails, the receiver has timed out
        drop(tx.send(result));
    });

    let timeout = Duration::from_secs(10);

    // Wait for either the test to complete or timeout.
    match rx.recv_timeout(timeout) {
        Ok(result) => {
            // Test completed successfully, join the thread to clean up
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            // Test timed out - this indicates the test is hanging
            panic!("Test exceeded 10-second timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // Thread panicked, join it to get the panic
            match test_handle.join() {
                Ok(()) => panic!("Test thread disconnected unexpectedly"),
                Err(e) => std::panic::resume_unwind(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchdog_allows_fast_tests() {
        let result = with_watchdog(|| 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn watchdog_propagates_panics() {
        let result = std::panic::catch_unwind(|| {
            with_watchdog(|| panic!("inner failure"));
        });
        assert!(result.is_err());
    }
}
