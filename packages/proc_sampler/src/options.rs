use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The interval used when none, or a zero interval, is requested.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Which dimensions a [`Sampler`][crate::Sampler] records and how often.
///
/// Every dimension is enabled by default.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use proc_sampler::SampleOptions;
///
/// let options = SampleOptions::default()
///     .with_network(false)
///     .with_interval(Duration::from_millis(250));
///
/// assert!(options.cpu());
/// assert!(!options.network());
/// assert_eq!(options.interval(), Duration::from_millis(250));
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SampleOptions {
    cpu: bool,
    memory: bool,
    io: bool,
    network: bool,
    interval: Duration,
}

impl SampleOptions {
    /// Enables or disables CPU usage readings.
    #[must_use]
    pub fn with_cpu(mut self, enabled: bool) -> Self {
        self.cpu = enabled;
        self
    }

    /// Enables or disables resident and virtual memory readings.
    #[must_use]
    pub fn with_memory(mut self, enabled: bool) -> Self {
        self.memory = enabled;
        self
    }

    /// Enables or disables disk IO counter readings.
    #[must_use]
    pub fn with_io(mut self, enabled: bool) -> Self {
        self.io = enabled;
        self
    }

    /// Enables or disables network interface counter readings.
    #[must_use]
    pub fn with_network(mut self, enabled: bool) -> Self {
        self.network = enabled;
        self
    }

    /// Sets the time between two readings. A zero interval selects [`DEFAULT_INTERVAL`].
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Whether CPU usage is recorded.
    #[must_use]
    pub fn cpu(&self) -> bool {
        self.cpu
    }

    /// Whether memory usage is recorded.
    #[must_use]
    pub fn memory(&self) -> bool {
        self.memory
    }

    /// Whether disk IO counters are recorded.
    #[must_use]
    pub fn io(&self) -> bool {
        self.io
    }

    /// Whether network interface counters are recorded.
    #[must_use]
    pub fn network(&self) -> bool {
        self.network
    }

    /// The effective time between two readings, never zero.
    #[must_use]
    pub fn interval(&self) -> Duration {
        if self.interval.is_zero() {
            DEFAULT_INTERVAL
        } else {
            self.interval
        }
    }

    pub(crate) fn needs_process(&self) -> bool {
        self.cpu || self.memory || self.io
    }
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            cpu: true,
            memory: true,
            io: true,
            network: true,
            interval: DEFAULT_INTERVAL,
        }
    }
}
