//! GPS provider error types.

/// Errors from the GPS provider client.
#[derive(Debug, thiserror::Error)]
pub enum GpsError {
    /// Network failure or timeout.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {message}")]
    Json { message: String },

    #[error("GPS provider error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unauthorized (invalid GPS API key)")]
    Unauthorized,

    #[error("rate limited by GPS provider")]
    RateLimited,

    #[error("invalid GPS configuration: {0}")]
    InvalidConfig(String),
}
