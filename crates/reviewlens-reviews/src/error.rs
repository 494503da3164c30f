use reviewlens_core::Transient;
use thiserror::Error;

/// Errors returned by the review-source client.
#[derive(Debug, Error)]
pub enum ReviewSourceError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The request did not complete within the configured deadline.
    #[error("review source timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("review source returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The response body is not the expected `{ "reviews": [...] }` shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid review source URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl Transient for ReviewSourceError {
    /// Network failures, timeouts, 429 and 5xx are retried; malformed bodies,
    /// other 4xx and configuration errors are not.
    fn is_transient(&self) -> bool {
        match self {
            ReviewSourceError::Http(e) => e.is_timeout() || e.is_connect(),
            ReviewSourceError::Timeout { .. } => true,
            ReviewSourceError::UnexpectedStatus { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            ReviewSourceError::Deserialize { .. } | ReviewSourceError::InvalidBaseUrl { .. } => {
                false
            }
        }
    }
}
