use std::fmt;

/// Orchestrator states for one request.
///
/// ```text
/// FetchingReviews -> ReviewsEmpty -------------------------------> Done
///                 -> ReviewsReady -> GeneratingInsights -> InsightsReady  -> Done
///                                                       -> InsightsFailed -> Done
/// FetchingReviews (failed, fallback on) -------------------------> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchingReviews,
    ReviewsEmpty,
    ReviewsReady,
    GeneratingInsights,
    InsightsReady,
    InsightsFailed,
    Done,
}

impl Stage {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::FetchingReviews => "fetching_reviews",
            Stage::ReviewsEmpty => "reviews_empty",
            Stage::ReviewsReady => "reviews_ready",
            Stage::GeneratingInsights => "generating_insights",
            Stage::InsightsReady => "insights_ready",
            Stage::InsightsFailed => "insights_failed",
            Stage::Done => "done",
        }
    }

    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (
                Stage::FetchingReviews,
                Stage::ReviewsEmpty | Stage::ReviewsReady | Stage::Done
            ) | (Stage::ReviewsEmpty, Stage::Done)
                | (Stage::ReviewsReady, Stage::GeneratingInsights | Stage::Done)
                | (
                    Stage::GeneratingInsights,
                    Stage::InsightsReady | Stage::InsightsFailed
                )
                | (Stage::InsightsReady | Stage::InsightsFailed, Stage::Done)
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
