//! Error types for the digest pipeline.
//!
//! Uses `thiserror` for structured error handling with automatic `From`
//! implementations. Two layers: [`ClientError`] for anything that goes wrong
//! talking to an upstream API (always recoverable at the pipeline level), and
//! [`PipelineError`] for hard failures that abort a run.

use std::time::Duration;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Middleware error
    #[error("Middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Rate limited by the upstream API (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Feed decoding error (non-JSON payloads such as Atom listings)
    #[error("Failed to decode feed: {0}")]
    Decode(String),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Returns true if this error is transient and worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Timeout(_) | Self::Server { .. })
    }

    /// Returns true if the lookup target simply does not exist upstream.
    ///
    /// A missing resource is a valid answer (zero signal), not a degraded one,
    /// so the broker does not tally it as a provider failure.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Hard failures that abort a pipeline run.
///
/// Everything else (an unreachable source, a timed-out provider call) is a
/// soft failure: recorded in the [`RunReport`](crate::models::RunReport) and
/// recovered locally, never raised through `Pipeline::run`.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Configuration rejected before any stage ran.
    #[error("Invalid configuration: {}", issues.join("; "))]
    InvalidConfig {
        /// One entry per invalid input, e.g. "days_lookback must be positive".
        issues: Vec<String>,
    },

    /// No source adapters were registered.
    #[error("No source adapters configured")]
    NoSources,

    /// Every source adapter returned an error.
    #[error("All {} sources failed: {}", errors.len(), errors.join("; "))]
    AllSourcesFailed {
        /// One "source: error" entry per adapter.
        errors: Vec<String>,
    },

    /// Every source succeeded but none produced a single record.
    #[error("No records harvested from any source for the given window")]
    NoRecords,
}

impl PipelineError {
    /// Create an invalid-configuration error.
    #[must_use]
    pub fn invalid_config(issues: Vec<String>) -> Self {
        Self::InvalidConfig { issues }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
