use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// A stand-in for a remote call: sleeps for a fixed delay and fails on every `fail_every`-th
/// invocation.
///
/// Invocations are numbered from 1 across all threads in the order they start. A `fail_every`
/// of zero never fails.
#[derive(Debug)]
pub struct SyntheticCall {
    delay: Duration,
    fail_every: u64,
    invocations: AtomicU64,
}

impl SyntheticCall {
    /// Creates the workload.
    #[must_use]
    pub fn new(delay: Duration, fail_every: u64) -> Self {
        Self {
            delay,
            fail_every,
            invocations: AtomicU64::new(0),
        }
    }

    /// Performs one invocation.
    ///
    /// # Errors
    ///
    /// Fails with `"synthetic failure"` on every `fail_every`-th invocation. Failing invocations
    /// return immediately, without the delay.
    pub fn call(&self) -> Result<(), &'static str> {
        let invocation = self
            .invocations
            .fetch_add(1, Ordering::Relaxed)
            .wrapping_add(1);

        // A zero divisor yields None, so fail_every == 0 never fails.
        if invocation.checked_rem(self.fail_every) == Some(0) {
            return Err("synthetic failure");
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
