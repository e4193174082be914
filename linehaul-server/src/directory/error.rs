//! Reference data error types.

/// Errors that can occur when loading or importing reference data.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Snapshot file could not be read
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file is not valid JSON for the expected shape
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// A row refers to a terminal code that cannot be parsed
    #[error("invalid terminal code in {context}: {code}")]
    InvalidCode { context: String, code: String },
}
