//! Canonical entities that flow between pipeline stages.
//!
//! Boundary shapes from the review source and the LLM provider never leave
//! their client crates; everything here is fully populated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author recorded when the review source omits one.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// One user-submitted rating and comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: String,
    /// 1–5 stars; `0` means the source rating was missing or unusable.
    pub rating: u8,
    pub text: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

/// Where a [`ReviewBatch`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchSource {
    /// Fetched from the review source.
    Live,
    /// Fixed placeholder data substituted after a failed fetch.
    Sample,
}

/// Wall-clock timing of one review fetch. Observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchTiming {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_ms: u64,
}

impl FetchTiming {
    #[must_use]
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let duration_ms = u64::try_from((end - start).num_milliseconds()).unwrap_or(0);
        Self {
            start,
            end,
            duration_ms,
        }
    }
}

/// Normalized result of one fetch, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBatch {
    pub app_name: String,
    pub source: BatchSource,
    pub reviews: Vec<Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_timing: Option<FetchTiming>,
}

impl ReviewBatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

/// Sentiment split reported by the model.
///
/// The two percentages are taken as returned; they are not guaranteed to sum
/// to 100. Use [`SentimentAnalysis::renormalized`] before presenting them as
/// a split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAnalysis {
    pub positive_percentage: f64,
    pub negative_percentage: f64,
    pub key_emotions: Vec<String>,
}

impl SentimentAnalysis {
    /// Rescales both percentages so they sum to 100.
    ///
    /// Left untouched when both are zero.
    #[must_use]
    pub fn renormalized(&self) -> Self {
        let positive = self.positive_percentage.max(0.0);
        let negative = self.negative_percentage.max(0.0);
        let total = positive + negative;
        if total <= f64::EPSILON {
            return self.clone();
        }
        Self {
            positive_percentage: positive / total * 100.0,
            negative_percentage: negative / total * 100.0,
            key_emotions: self.key_emotions.clone(),
        }
    }
}

/// Structured feedback produced by one LLM invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub common_praises: Vec<String>,
    pub common_complaints: Vec<String>,
    pub feature_requests: Vec<String>,
    pub user_experience: String,
    pub sentiment_analysis: SentimentAnalysis,
    pub actionable_recommendations: Vec<String>,
}

/// Output of one pipeline run.
///
/// `insights` and `insight_error` are never both set; the constructors are
/// the only way to build one. Neither being set means insight generation
/// was not attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    #[serde(flatten)]
    review_batch: ReviewBatch,
    insights: Option<Insights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    insight_error: Option<String>,
}

impl PipelineResult {
    /// Reviews only; the insight stage was not attempted.
    #[must_use]
    pub fn reviews_only(review_batch: ReviewBatch) -> Self {
        Self {
            review_batch,
            insights: None,
            insight_error: None,
        }
    }

    #[must_use]
    pub fn with_insights(review_batch: ReviewBatch, insights: Insights) -> Self {
        Self {
            review_batch,
            insights: Some(insights),
            insight_error: None,
        }
    }

    #[must_use]
    pub fn with_insight_error(review_batch: ReviewBatch, error: impl Into<String>) -> Self {
        Self {
            review_batch,
            insights: None,
            insight_error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn review_batch(&self) -> &ReviewBatch {
        &self.review_batch
    }

    #[must_use]
    pub fn insights(&self) -> Option<&Insights> {
        self.insights.as_ref()
    }

    #[must_use]
    pub fn insight_error(&self) -> Option<&str> {
        self.insight_error.as_deref()
    }

    #[must_use]
    pub fn into_review_batch(self) -> ReviewBatch {
        self.review_batch
    }
}
