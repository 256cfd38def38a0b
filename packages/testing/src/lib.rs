#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in call_bench packages.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout so that a hung dispatcher fails the test instead of the build.
///
/// The timeout is 30 seconds under normal conditions and 120 seconds under Miri, where thread
/// synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog is disabled and
/// the test function is executed directly. This allows mutation testing to properly detect
/// hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // If this fails, the receiver has timed out.
        drop(tx.send(result));
    });

    let timeout = if cfg!(miri) {
        Duration::from_secs(120)
    } else {
        Duration::from_secs(30)
    };

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("Test exceeded {timeout:?} timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_handle.join() {
            Ok(()) => panic!("Test thread disconnected unexpectedly"),
            Err(e) => std::panic::resume_unwind(e),
        },
    }
}

/// A benchmark target with scripted behavior: it sleeps for a fixed delay and succeeds, except
/// on selected invocations, where it fails immediately.
///
/// Invocations are numbered from 1 in the order they start, across all threads.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
///
/// use testing::ScriptedCall;
///
/// let target = ScriptedCall::new(Duration::ZERO).failing_on([2]);
///
/// assert!(target.call().is_ok());
/// assert!(target.call().is_err());
/// assert_eq!(target.invocations(), 2);
/// ```
#[derive(Debug)]
pub struct ScriptedCall {
    delay: Duration,
    failing_invocations: Vec<u64>,
    invocations: AtomicU64,
}

impl ScriptedCall {
    /// Creates a target that always succeeds after `delay`.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failing_invocations: Vec::new(),
            invocations: AtomicU64::new(0),
        }
    }

    /// Makes the given invocation numbers fail immediately.
    #[must_use]
    pub fn failing_on(mut self, invocations: impl IntoIterator<Item = u64>) -> Self {
        self.failing_invocations.extend(invocations);
        self
    }

    /// Performs one scripted invocation.
    ///
    /// # Errors
    ///
    /// Fails with `"scripted failure"` on the invocations selected via
    /// [`failing_on()`][Self::failing_on].
    pub fn call(&self) -> Result<(), String> {
        let invocation = self
            .invocations
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);

        if self.failing_invocations.contains(&invocation) {
            return Err("scripted failure".to_string());
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        Ok(())
    }

    /// How many invocations have started so far.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}
