//! Typed errors for the enrichment library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Almost every error here is
//! recovered inside the pipeline; they exist so that failures can be logged and
//! reported per platform rather than aborting a page.

use thiserror::Error;

use crate::types::platform::Platform;

/// Pipeline-level failures. Only `Sink` ever leaves the pipeline as `Err`; the
/// others are recorded in the output record's dispatch report. Configuration
/// problems surface earlier, as [`ConfigError`], when the enricher is built.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Link with a missing or unparseable URL
    #[error("malformed link: {url:?}")]
    MalformedLink { url: Option<String> },

    /// No provider registered for a platform that had input
    #[error("no provider registered for {0}")]
    UnsupportedPlatform(Platform),

    /// A provider lookup failed for one platform
    #[error("provider failed for {platform}: {source}")]
    Provider {
        platform: Platform,
        #[source]
        source: ProviderError,
    },

    /// A single short link could not be expanded
    #[error("short link resolution failed for {url}: {source}")]
    ShortLinkResolution {
        url: String,
        #[source]
        source: ResolveError,
    },

    /// Every dispatched platform failed
    #[error("all {attempted} dispatched provider lookups failed")]
    TotalDispatchFailure { attempted: usize },

    /// Handing the record to the sink failed
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Errors returned by a profile provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or remote API failure
    #[error("provider transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider rejected the request input
    #[error("invalid provider input: {0}")]
    InvalidInput(String),

    /// Provider ran but reported failure
    #[error("provider run failed: {0}")]
    RunFailed(String),

    /// Lookup did not complete before the dispatch deadline
    #[error("provider lookup timed out")]
    Timeout,

    /// Lookup was cancelled by the caller
    #[error("provider lookup cancelled")]
    Cancelled,
}

impl From<apify_client::ApifyError> for ProviderError {
    fn from(err: apify_client::ApifyError) -> Self {
        match err {
            apify_client::ApifyError::RunFailed(status) => ProviderError::RunFailed(status),
            other => ProviderError::Transport(Box::new(other)),
        }
    }
}

/// Errors from short-link expansion.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Non-success status before the link ever left its short-link host
    #[error("HTTP {status} resolving {url}")]
    Status { url: String, status: u16 },

    /// Server answered without redirecting off the short-link host
    #[error("short link {url} did not redirect")]
    NotRedirected { url: String },
}

/// Errors from emitting a record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Username pattern that does not compile or lacks a capture group
    #[error("invalid username pattern for {platform}: {reason}")]
    Pattern { platform: Platform, reason: String },

    /// Same platform listed twice
    #[error("duplicate platform entry: {0}")]
    DuplicatePlatform(Platform),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for provider lookups.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Result type alias for short-link resolution.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Result type alias for sink operations.
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// Result type alias for configuration.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
