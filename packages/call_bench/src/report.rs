use std::fmt::{self, Display};
use std::sync::OnceLock;
use std::time::Duration;

use crate::{Result, RunResult};

/// Width of the label column, the length of the longest fixed label (`TIME USED`).
const LABEL_WIDTH: usize = 9;

/// Text used in place of a latency figure when the run has no latency data.
const NO_DATA: &str = "n/a";

/// A human-readable rendering of a [`RunResult`].
///
/// The layout is fixed: one line per figure, labels padded to a common width, followed by one
/// line per requested percentile in request order. Rendering the same result twice yields the
/// same text.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_bench::{Percentile, Recording, RecordingPolicy, Report, RunResult, Sample};
///
/// let result = RunResult::reduce(
///     "example",
///     Recording::from_samples(vec![Sample::Success(Duration::from_millis(3))]),
///     Duration::from_secs(1),
///     &[Percentile::P99],
///     RecordingPolicy::ExcludeFailures,
/// );
///
/// let text = Report::new(&result).to_string();
/// assert!(text.contains("TP99     : 3.00ms"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Report<'a> {
    result: &'a RunResult,
}

impl<'a> Report<'a> {
    /// Creates a report for the given result.
    #[must_use]
    pub fn new(result: &'a RunResult) -> Self {
        Self { result }
    }
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;

        write_line(f, "NAME", result.name())?;
        write_line(f, "TOTAL", format_args!("{} times", result.total()))?;
        write_line(
            f,
            "SUCCESS",
            format_args!("{}, {:.2}%", result.succeeded(), result.success_rate()),
        )?;
        write_line(
            f,
            "FAILED",
            format_args!("{}, {:.2}%", result.failed(), result.failure_rate()),
        )?;

        match result.throughput() {
            Some(throughput) => write_line(f, "TPS", throughput.trunc())?,
            None => write_line(f, "TPS", NO_DATA)?,
        }

        write_line(f, "TIME USED", format_duration(result.elapsed()))?;
        write_line(f, "MIN USED", latency_text(result.min()))?;
        write_line(f, "AVG USED", latency_text(result.mean()))?;
        write!(f, "{:<LABEL_WIDTH$}: {}", "MAX USED", latency_text(result.max()))?;

        for percentile in result.requested_percentiles() {
            writeln!(f)?;
            write!(
                f,
                "{:<LABEL_WIDTH$}: {}",
                percentile.label(),
                latency_text(result.percentile(*percentile))
            )?;
        }

        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, label: &str, value: impl Display) -> fmt::Result {
    writeln!(f, "{label:<LABEL_WIDTH$}: {value}")
}

fn latency_text(value: Result<Duration>) -> String {
    value.map_or_else(|_no_data| NO_DATA.to_string(), format_duration)
}

/// A [`Report`] whose text is rendered once and reused afterwards.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_bench::{CachedReport, Recording, RecordingPolicy, RunResult, Sample};
///
/// let result = RunResult::reduce(
///     "example",
///     Recording::from_samples(vec![Sample::Success(Duration::from_micros(7))]),
///     Duration::from_secs(1),
///     &[],
///     RecordingPolicy::ExcludeFailures,
/// );
///
/// let report = CachedReport::new(&result);
/// assert_eq!(report.as_str(), report.as_str());
/// ```
#[derive(Debug)]
pub struct CachedReport<'a> {
    report: Report<'a>,
    rendered: OnceLock<String>,
}

impl<'a> CachedReport<'a> {
    /// Creates a cached report for the given result. Nothing is rendered until first use.
    #[must_use]
    pub fn new(result: &'a RunResult) -> Self {
        Self {
            report: Report::new(result),
            rendered: OnceLock::new(),
        }
    }

    /// The rendered report text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.rendered.get_or_init(|| self.report.to_string())
    }
}

impl Display for CachedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Formats a duration with the largest unit that keeps the value at or above 1.
///
/// Whole nanoseconds are printed below one microsecond, otherwise two decimals are used.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use call_bench::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(999)), "999ns");
/// assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
/// assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    #[expect(clippy::cast_precision_loss, reason = "two decimals are all we print")]
    let value = nanos as f64;

    if nanos >= 1_000_000_000 {
        format!("{:.2}s", value / 1e9)
    } else if nanos >= 1_000_000 {
        format!("{:.2}ms", value / 1e6)
    } else if nanos >= 1_000 {
        format!("{:.2}us", value / 1e3)
    } else {
        format!("{nanos}ns")
    }
}
