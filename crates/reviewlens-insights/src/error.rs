use reviewlens_core::Transient;
use thiserror::Error;

/// Failures of the insight stage.
///
/// The `Display` text of each variant is what callers see as the result's
/// `insightError`, so it names the failing step plainly.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("no reviews to analyze")]
    NoReviews,

    /// The API key is unset or still a placeholder; no request was sent.
    #[error("LLM API key is not configured; insight generation skipped")]
    MissingCredential,

    #[error("LLM request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("LLM provider returned HTTP {status}: {body}")]
    ProviderError { status: u16, body: String },

    #[error("LLM response contained no message content")]
    EmptyResponse,

    /// The content string did not parse as an insights JSON object.
    /// `raw` keeps the untouched model output for diagnostics.
    #[error("could not parse insights from model output: {reason}")]
    MalformedInsights { reason: String, raw: String },

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider's response envelope did not match the chat-completions shape.
    #[error("unexpected LLM response envelope: {source}")]
    Deserialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid LLM endpoint \"{url}\": {reason}")]
    InvalidEndpoint { url: String, reason: String },
}

impl Transient for InsightError {
    /// Connection failures, 429 and 5xx are retried. Timeouts are not: the
    /// deadline already bounds how long a caller waits for one answer.
    fn is_transient(&self) -> bool {
        match self {
            InsightError::Http(e) => e.is_connect(),
            InsightError::ProviderError { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            InsightError::NoReviews
            | InsightError::MissingCredential
            | InsightError::Timeout { .. }
            | InsightError::EmptyResponse
            | InsightError::MalformedInsights { .. }
            | InsightError::Deserialize { .. }
            | InsightError::InvalidEndpoint { .. } => false,
        }
    }
}
