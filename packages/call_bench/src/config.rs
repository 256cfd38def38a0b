use std::fmt::{self, Display};
use std::num::NonZero;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_PERCENTILES, Error, Percentile, Result};

/// Decides which recorded durations take part in the latency statistics of a run.
///
/// A run commits to exactly one policy. Success and failure counters and the error tally are
/// maintained the same way under both policies; only the latency statistics differ.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum RecordingPolicy {
    /// Only successful calls contribute to min, max, mean and percentiles.
    #[default]
    ExcludeFailures,

    /// Every call contributes its elapsed time, whether it succeeded or not.
    IncludeFailures,
}

impl Display for RecordingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExcludeFailures => "exclude_failures",
            Self::IncludeFailures => "include_failures",
        })
    }
}

impl FromStr for RecordingPolicy {
    type Err = Error;

    /// Parses `exclude_failures` or `include_failures`, accepting dashes in place of underscores.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exclude_failures" => Ok(Self::ExcludeFailures),
            "include_failures" => Ok(Self::IncludeFailures),
            _ => Err(Error::InvalidConfig {
                problem: format!(
                    "unknown recording policy '{s}', expected exclude_failures or include_failures"
                ),
            }),
        }
    }
}

/// Describes one benchmark run: how many workers, how many calls and what to report.
///
/// # Examples
///
/// ```
/// use call_bench::{Percentile, RunConfig};
///
/// let config = RunConfig::new(4, 1000)
///     .unwrap()
///     .with_percentiles([50, 99, 999].map(Percentile::new));
///
/// assert_eq!(config.concurrency().get(), 4);
/// assert_eq!(config.total_calls().get(), 1000);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunConfig {
    concurrency: NonZero<usize>,
    total_calls: NonZero<u64>,
    percentiles: Vec<Percentile>,
    policy: RecordingPolicy,
}

impl RunConfig {
    /// Creates a configuration with the default percentiles and recording policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if either `concurrency` or `total_calls` is zero.
    pub fn new(concurrency: usize, total_calls: u64) -> Result<Self> {
        let concurrency = NonZero::new(concurrency).ok_or_else(|| Error::InvalidConfig {
            problem: "concurrency must be at least 1".to_string(),
        })?;

        let total_calls = NonZero::new(total_calls).ok_or_else(|| Error::InvalidConfig {
            problem: "total call count must be at least 1".to_string(),
        })?;

        Ok(Self::from_non_zero(concurrency, total_calls))
    }

    /// Creates a configuration from values that are already known to be non-zero.
    #[must_use]
    pub fn from_non_zero(concurrency: NonZero<usize>, total_calls: NonZero<u64>) -> Self {
        Self {
            concurrency,
            total_calls,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            policy: RecordingPolicy::default(),
        }
    }

    /// Replaces the reported percentiles. Order is preserved in reports.
    #[must_use]
    pub fn with_percentiles(mut self, percentiles: impl IntoIterator<Item = Percentile>) -> Self {
        self.percentiles = percentiles.into_iter().collect();
        self
    }

    /// Replaces the recording policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RecordingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Number of worker threads that claim calls concurrently.
    #[must_use]
    pub fn concurrency(&self) -> NonZero<usize> {
        self.concurrency
    }

    /// Total number of calls made during the run.
    #[must_use]
    pub fn total_calls(&self) -> NonZero<u64> {
        self.total_calls
    }

    /// Percentiles to compute eagerly and show in reports, in request order.
    #[must_use]
    pub fn percentiles(&self) -> &[Percentile] {
        &self.percentiles
    }

    /// The recording policy of the run.
    #[must_use]
    pub fn policy(&self) -> RecordingPolicy {
        self.policy
    }
}
