use thiserror::Error;

/// Errors that can occur when configuring a benchmark or reading its results.
///
/// Failures of the benchmarked calls themselves are never reported through this type. They are
/// recorded as data in the [`RunResult`][crate::RunResult] instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The caller provided a run configuration that cannot be executed.
    #[error("invalid run configuration: {problem}")]
    InvalidConfig {
        /// A human-readable description of the problem.
        problem: String,
    },

    /// The caller provided a percentile in text form that is not an integer.
    #[error("invalid percentile: '{invalid_value}' is not an integer percentile")]
    InvalidPercentile {
        /// The text that could not be parsed.
        invalid_value: String,
    },

    /// No sample participates in the statistics, either because no calls were made
    /// or because every call failed and failures are excluded from the statistics.
    #[error("no latency data: no sample participates in the statistics")]
    NoData,

    /// The raw sample set could not be converted to or from its JSON form.
    #[error("sample serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for benchmark operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;
