use std::collections::BTreeMap;
use std::num::NonZero;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use foldhash::{HashMap, HashMapExt};
use serde::Serialize;

use crate::{Error, ErrorTally, Percentile, Recording, RecordingPolicy, Result, Sample};

/// The statistics of one completed run.
///
/// Latency statistics (`min`, `max`, `mean`, `sum` and percentiles) are computed only over the
/// samples that the [`RecordingPolicy`] lets participate. When no sample participates, every
/// latency accessor returns [`Error::NoData`] rather than a misleading zero.
///
/// Percentile lookups are memoized: the first lookup of a percentile stores its value and every
/// later lookup returns the stored value.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_bench::{Percentile, Recording, RecordingPolicy, RunResult, Sample};
///
/// let recording = Recording::from_samples(
///     (0..100).map(|n| Sample::Success(Duration::from_millis(n))).collect(),
/// );
///
/// let result = RunResult::reduce(
///     "ramp",
///     recording,
///     Duration::from_secs(1),
///     &[Percentile::P50, Percentile::P999],
///     RecordingPolicy::ExcludeFailures,
/// );
///
/// assert_eq!(result.percentile(Percentile::P50).unwrap(), Duration::from_millis(50));
/// assert_eq!(result.percentile(Percentile::P999).unwrap(), Duration::from_millis(99));
/// ```
#[derive(Debug)]
pub struct RunResult {
    name: String,
    total: u64,
    elapsed: Duration,
    succeeded: u64,
    failed: u64,
    errors: ErrorTally,
    policy: RecordingPolicy,
    percentiles: Vec<Percentile>,

    // None if no sample participates in the statistics.
    latency: Option<Latency>,
}

#[derive(Debug)]
struct Latency {
    // Ascending, never empty.
    sorted: Box<[Duration]>,
    sum: Duration,
    mean: Duration,
    percentile_cache: Mutex<HashMap<Percentile, Duration>>,
}

impl Latency {
    fn new(sorted: Box<[Duration]>) -> Option<Self> {
        let count = NonZero::new(sorted.len())?;

        let sum = sorted
            .iter()
            .fold(Duration::ZERO, |sum, sample| sum.saturating_add(*sample));

        #[expect(
            clippy::integer_division,
            reason = "nanosecond precision is the resolution of the samples themselves"
        )]
        let mean_nanos = sum
            .as_nanos()
            .checked_div(count.get() as u128)
            .expect("count is NonZero, so division by zero is impossible");

        Some(Self {
            sorted,
            sum,
            mean: Duration::from_nanos(u64::try_from(mean_nanos).unwrap_or(u64::MAX)),
            percentile_cache: Mutex::new(HashMap::new()),
        })
    }

    fn count(&self) -> NonZero<usize> {
        NonZero::new(self.sorted.len()).expect("type invariant - sorted samples are never empty")
    }

    fn min(&self) -> Duration {
        *self
            .sorted
            .first()
            .expect("type invariant - sorted samples are never empty")
    }

    fn max(&self) -> Duration {
        *self
            .sorted
            .last()
            .expect("type invariant - sorted samples are never empty")
    }

    fn percentile(&self, percentile: Percentile) -> Duration {
        let mut cache = self
            .percentile_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        *cache.entry(percentile).or_insert_with(|| {
            *self
                .sorted
                .get(percentile.rank(self.count()))
                .expect("rank is clamped to the last sample")
        })
    }
}

impl RunResult {
    /// Reduces a recording into statistics.
    ///
    /// `elapsed` is the wall-clock span of the whole run. The requested percentiles are computed
    /// immediately and kept in request order for reports.
    ///
    /// The raw per-ticket order of the samples is not retained.
    #[must_use]
    pub fn reduce(
        name: impl Into<String>,
        recording: Recording,
        elapsed: Duration,
        percentiles: &[Percentile],
        policy: RecordingPolicy,
    ) -> Self {
        let (samples, succeeded, failed, errors) = recording.into_parts();

        let total = samples.len() as u64;

        let mut participating = samples
            .into_iter()
            .filter_map(|sample| match (sample, policy) {
                (Sample::Success(duration), _)
                | (Sample::Failure(duration), RecordingPolicy::IncludeFailures) => Some(duration),
                (Sample::Failure(_), RecordingPolicy::ExcludeFailures) => None,
            })
            .collect::<Vec<_>>();

        participating.sort();

        let latency = Latency::new(participating.into_boxed_slice());

        let name = name.into();

        if latency.is_none() {
            tracing::warn!(
                name = name.as_str(),
                total,
                failed,
                "run produced no usable latency samples"
            );
        }

        let result = Self {
            name,
            total,
            elapsed,
            succeeded,
            failed,
            errors,
            policy,
            percentiles: percentiles.to_vec(),
            latency,
        };

        if let Some(latency) = &result.latency {
            for percentile in percentiles {
                latency.percentile(*percentile);
            }
        }

        tracing::debug!(
            name = result.name.as_str(),
            total,
            succeeded,
            failed,
            elapsed_ns = nanos(elapsed),
            "reduced run"
        );

        result
    }

    /// Name of the benchmark that produced this result.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of calls made.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Wall-clock span of the run, from before the first claim to after the last worker stopped.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of calls that returned `Ok`.
    #[must_use]
    pub fn succeeded(&self) -> u64 {
        self.succeeded
    }

    /// Number of calls that returned `Err`.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Percentage (0 to 100) of calls that succeeded. Zero for a run without calls.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        rate(self.succeeded, self.total)
    }

    /// Percentage (0 to 100) of calls that failed. Zero for a run without calls.
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        rate(self.failed, self.total)
    }

    /// Successful calls per wall-clock second, or `None` if no time elapsed.
    #[must_use]
    pub fn throughput(&self) -> Option<f64> {
        let seconds = self.elapsed.as_secs_f64();

        #[expect(
            clippy::cast_precision_loss,
            reason = "throughput is an approximate figure for humans"
        )]
        let succeeded = self.succeeded as f64;

        (seconds > 0.0).then(|| succeeded / seconds)
    }

    /// Failure messages and how often each occurred.
    #[must_use]
    pub fn errors(&self) -> &ErrorTally {
        &self.errors
    }

    /// The recording policy the statistics were computed under.
    #[must_use]
    pub fn policy(&self) -> RecordingPolicy {
        self.policy
    }

    /// The percentiles requested for this run, in request order.
    #[must_use]
    pub fn requested_percentiles(&self) -> &[Percentile] {
        &self.percentiles
    }

    /// Whether any sample participates in the latency statistics.
    #[must_use]
    pub fn has_latency_data(&self) -> bool {
        self.latency.is_some()
    }

    /// The smallest participating duration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if no sample participates in the statistics.
    pub fn min(&self) -> Result<Duration> {
        self.latency().map(Latency::min)
    }

    /// The largest participating duration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if no sample participates in the statistics.
    pub fn max(&self) -> Result<Duration> {
        self.latency().map(Latency::max)
    }

    /// The arithmetic mean of the participating durations, truncated to whole nanoseconds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if no sample participates in the statistics.
    pub fn mean(&self) -> Result<Duration> {
        self.latency().map(|latency| latency.mean)
    }

    /// The sum of the participating durations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if no sample participates in the statistics.
    pub fn sum(&self) -> Result<Duration> {
        self.latency().map(|latency| latency.sum)
    }

    /// The nearest-rank value of `percentile` among the participating durations.
    ///
    /// See [`Percentile`] for how values of 100 and above are interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoData`] if no sample participates in the statistics.
    pub fn percentile(&self, percentile: Percentile) -> Result<Duration> {
        self.latency().map(|latency| latency.percentile(percentile))
    }

    /// The participating durations, ascending. Empty if there are none.
    #[must_use]
    pub fn samples(&self) -> &[Duration] {
        match &self.latency {
            Some(latency) => &latency.sorted,
            None => &[],
        }
    }

    /// Renders the result, including the sorted sample set in nanoseconds, as JSON.
    ///
    /// Latency fields are `null` when there is no latency data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if the JSON encoder fails.
    pub fn to_json(&self) -> Result<String> {
        let percentiles = self
            .percentiles
            .iter()
            .map(|p| (p.label(), self.percentile(*p).ok().map(nanos)))
            .collect::<BTreeMap<_, _>>();

        let view = JsonView {
            name: &self.name,
            total: self.total,
            elapsed_ns: nanos(self.elapsed),
            succeeded: self.succeeded,
            failed: self.failed,
            throughput: self.throughput(),
            policy: self.policy,
            min_ns: self.min().ok().map(nanos),
            mean_ns: self.mean().ok().map(nanos),
            max_ns: self.max().ok().map(nanos),
            percentiles_ns: percentiles,
            errors: &self.errors,
            samples_ns: self.samples().iter().copied().map(nanos).collect(),
        };

        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn latency(&self) -> Result<&Latency> {
        self.latency.as_ref().ok_or(Error::NoData)
    }
}

#[derive(Serialize)]
struct JsonView<'a> {
    name: &'a str,
    total: u64,
    elapsed_ns: u64,
    succeeded: u64,
    failed: u64,
    throughput: Option<f64>,
    policy: RecordingPolicy,
    min_ns: Option<u64>,
    mean_ns: Option<u64>,
    max_ns: Option<u64>,
    percentiles_ns: BTreeMap<String, Option<u64>>,
    errors: &'a ErrorTally,
    samples_ns: Vec<u64>,
}

fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "rates are approximate figures for humans"
)]
fn rate(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    part as f64 / total as f64 * 100.0
}
