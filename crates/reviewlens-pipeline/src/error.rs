use reviewlens_insights::InsightError;
use reviewlens_reviews::ReviewSourceError;
use thiserror::Error;

/// Failures that escape the orchestrator.
///
/// Insight-stage failures never appear here; they are carried in the
/// result's `insightError` instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The review fetch failed after retries and sample fallback is
    /// disabled.
    #[error("review source unavailable for \"{app_id}\": {source}")]
    SourceUnavailable {
        app_id: String,
        #[source]
        source: ReviewSourceError,
    },

    #[error("failed to build review source client: {0}")]
    ReviewClient(#[source] ReviewSourceError),

    #[error("failed to build insight client: {0}")]
    InsightClient(#[source] InsightError),
}
