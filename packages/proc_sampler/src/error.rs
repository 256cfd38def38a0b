/// Errors that can occur when creating a sampler or exporting its series.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No live process has the requested process ID.
    #[error("no process with ID {pid} exists")]
    ProcessNotFound {
        /// The process ID that was looked up.
        pid: u32,
    },

    /// No live process has the requested name.
    #[error("no process named '{name}' exists")]
    ProcessNameNotFound {
        /// The process name that was looked up.
        name: String,
    },

    /// A sample series could not be converted to or from JSON.
    #[error("sample series serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` type for sampler operations, returning the crate's [`Error`] type.
pub(crate) type Result<T> = std::result::Result<T, Error>;
