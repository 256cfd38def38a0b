use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use foldhash::{HashMap, HashMapExt};
use serde::{Deserialize, Serialize};

use crate::Ticket;

/// The recorded outcome of one call.
///
/// Serialized as `{"success": <nanoseconds>}` or `{"failure": <nanoseconds>}`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sample {
    /// The call returned `Ok` after the given time.
    Success(#[serde(with = "nanos")] Duration),

    /// The call returned `Err` after the given time.
    Failure(#[serde(with = "nanos")] Duration),
}

impl Sample {
    /// Time from just before the call until just after it returned.
    #[must_use]
    pub fn elapsed(self) -> Duration {
        match self {
            Self::Success(elapsed) | Self::Failure(elapsed) => elapsed,
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success(_))
    }
}

mod nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Duration,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_nanos()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_nanos)
    }
}

/// Number of occurrences of each distinct error message observed during a run.
///
/// Two different errors that render to the same message share one entry.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ErrorTally {
    counts: HashMap<String, u64>,
}

impl ErrorTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }

    /// Counts one more occurrence of `message`.
    pub fn record(&mut self, message: String) {
        let count = self.counts.entry(message).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// How many times `message` was observed.
    #[must_use]
    pub fn count(&self, message: &str) -> u64 {
        self.counts.get(message).copied().unwrap_or(0)
    }

    /// Number of distinct messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no failure was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over `(message, count)` pairs, most frequent first, ties ordered by message.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        let mut entries = self
            .counts
            .iter()
            .map(|(message, count)| (message.as_str(), *count))
            .collect::<Vec<_>>();

        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        entries.into_iter()
    }
}

/// Times calls and stores each outcome in the slot that belongs to the call's ticket.
///
/// Slots need no lock because every ticket is claimed exactly once. Success and failure counts
/// are atomics. Only the error tally, being a map, is guarded by a mutex.
///
/// # Examples
///
/// ```
/// use std::num::NonZero;
///
/// use call_bench::{Recorder, WorkerPool, dispatch};
///
/// let mut pool = WorkerPool::new(NonZero::new(2).unwrap());
/// let recorder = Recorder::new(4);
///
/// dispatch(&mut pool, 4, |ticket| {
///     recorder.record(ticket, || {
///         if ticket.get() == 4 { Err("boom") } else { Ok(()) }
///     });
/// });
///
/// let recording = recorder.finish();
/// assert_eq!(recording.succeeded(), 3);
/// assert_eq!(recording.failed(), 1);
/// assert_eq!(recording.errors().count("boom"), 1);
/// ```
#[derive(Debug)]
pub struct Recorder {
    slots: Box<[OnceLock<Sample>]>,
    succeeded: AtomicU64,
    failed: AtomicU64,
    errors: Mutex<ErrorTally>,
}

impl Recorder {
    /// Creates a recorder with one empty slot per ticket in `1..=total_calls`.
    ///
    /// # Panics
    ///
    /// Panics if `total_calls` slots cannot be addressed on this platform.
    #[must_use]
    pub fn new(total_calls: u64) -> Self {
        let total_calls = usize::try_from(total_calls)
            .expect("call count that exceeds virtual memory size is impossible to record");

        Self {
            slots: (0..total_calls).map(|_| OnceLock::new()).collect(),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            errors: Mutex::new(ErrorTally::new()),
        }
    }

    /// Executes `call`, measures it and stores the outcome in the slot of `ticket`.
    ///
    /// A failing call is recorded as data and never propagated.
    ///
    /// # Panics
    ///
    /// Panics if `ticket` has no slot or its slot was already written.
    pub fn record<F, E>(&self, ticket: Ticket, call: F)
    where
        F: FnOnce() -> Result<(), E>,
        E: Display,
    {
        let slot = self
            .slots
            .get(ticket.slot_index())
            .expect("ticket must be within the call count the recorder was created for");

        let start = Instant::now();
        let outcome = call();
        let elapsed = start.elapsed();

        let sample = match outcome {
            Ok(()) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                Sample::Success(elapsed)
            }
            Err(error) => {
                self.failed.fetch_add(1, Ordering::Relaxed);

                let message = error.to_string();
                self.errors
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .record(message);

                Sample::Failure(elapsed)
            }
        };

        assert!(
            slot.set(sample).is_ok(),
            "ticket {ticket} was recorded twice"
        );
    }

    /// Ends recording and hands out the samples in ticket order.
    ///
    /// # Panics
    ///
    /// Panics if any ticket was not recorded.
    #[must_use]
    pub fn finish(self) -> Recording {
        let samples = self
            .slots
            .into_vec()
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.into_inner().unwrap_or_else(|| {
                    panic!("ticket {} was never recorded", index.saturating_add(1))
                })
            })
            .collect();

        Recording {
            samples,
            succeeded: self.succeeded.into_inner(),
            failed: self.failed.into_inner(),
            errors: self
                .errors
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Everything recorded during a run, before reduction.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Recording {
    samples: Vec<Sample>,
    succeeded: u64,
    failed: u64,
    errors: ErrorTally,
}

impl Recording {
    /// Builds a recording from samples in ticket order, deriving the counters from the samples.
    ///
    /// Failure messages are not part of a sample, so the error tally starts out empty.
    #[must_use]
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let succeeded = samples.iter().filter(|sample| sample.is_success()).count() as u64;
        let failed = (samples.len() as u64).saturating_sub(succeeded);

        Self {
            samples,
            succeeded,
            failed,
            errors: ErrorTally::new(),
        }
    }

    /// Samples in ticket order: the sample of ticket `i` is at index `i - 1`.
    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
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

    /// Failure messages and how often each occurred.
    #[must_use]
    pub fn errors(&self) -> &ErrorTally {
        &self.errors
    }

    /// Serializes the samples, in ticket order, as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`][crate::Error::Serialization] if the JSON encoder fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.samples)?)
    }

    /// Parses samples produced by [`to_json()`][Self::to_json], keeping their order.
    ///
    /// The error tally is not part of the JSON form and starts out empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`][crate::Error::Serialization] if `json` is not a valid
    /// sample array.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let samples: Vec<Sample> = serde_json::from_str(json)?;
        Ok(Self::from_samples(samples))
    }

    pub(crate) fn into_parts(self) -> (Vec<Sample>, u64, u64, ErrorTally) {
        (self.samples, self.succeeded, self.failed, self.errors)
    }
}
