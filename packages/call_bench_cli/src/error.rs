use std::io;
use std::path::PathBuf;

/// Errors that stop the command-line driver before or while running a benchmark.
///
/// Failing benchmark calls are not errors. They are part of the report.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CliError {
    /// The plan file could not be read.
    #[error("failed to read plan file {}: {source}", path.display())]
    ReadPlan {
        /// The plan file that was requested.
        path: PathBuf,

        /// The underlying IO error.
        source: io::Error,
    },

    /// The plan file is not a valid plan.
    #[error("invalid plan file: {0}")]
    ParsePlan(#[from] toml::de::Error),

    /// The plan describes a benchmark that cannot be run, or its results could not be exported.
    #[error(transparent)]
    Benchmark(#[from] call_bench::Error),

    /// The process to observe could not be found, or its readings could not be exported.
    #[error(transparent)]
    Sampler(#[from] proc_sampler::Error),

    /// The combined JSON output could not be produced.
    #[error("failed to produce JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for the command-line driver.
pub(crate) type Result<T> = std::result::Result<T, CliError>;
