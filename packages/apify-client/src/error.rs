//! Error types for the Apify client.

use thiserror::Error;

/// Result type for Apify client operations.
pub type Result<T> = std::result::Result<T, ApifyError>;

/// Apify client errors.
#[derive(Debug, Error)]
pub enum ApifyError {
    /// Network error (connection failed, timeout, redirect loop)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the Apify API
    #[error("Apify API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The actor run finished in a terminal non-success state
    #[error("actor run ended with status {0}")]
    RunFailed(String),

    /// Dataset items or run metadata could not be decoded
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
