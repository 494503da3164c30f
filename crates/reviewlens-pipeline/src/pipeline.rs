//! The per-request state machine.

use reviewlens_core::{resolve_app_name, AppConfig, PipelineResult, RetryPolicy, ReviewBatch};
use reviewlens_insights::{build_prompt, AnalysisPrompt, InsightClient};
use reviewlens_reviews::{sample_batch, ReviewSourceClient};
use tokio_util::sync::CancellationToken;

use crate::error::PipelineError;
use crate::stage::Stage;

/// Tunables that are not part of either client.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub review_policy: RetryPolicy,
    pub llm_policy: RetryPolicy,
    pub sample_size: usize,
    pub sample_fallback: bool,
    pub normalize_sentiment: bool,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            review_policy: config.review_retry_policy(),
            llm_policy: config.llm_retry_policy(),
            sample_size: config.sample_size,
            sample_fallback: config.sample_fallback,
            normalize_sentiment: config.normalize_sentiment,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            review_policy: RetryPolicy::default(),
            llm_policy: RetryPolicy::immediate(1),
            sample_size: reviewlens_insights::DEFAULT_SAMPLE_SIZE,
            sample_fallback: true,
            normalize_sentiment: false,
        }
    }
}

/// Orchestrates review fetching and insight generation.
///
/// Holds no per-request state; one instance is shared across requests.
pub struct Pipeline {
    reviews: ReviewSourceClient,
    insights: InsightClient,
    options: PipelineOptions,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        reviews: ReviewSourceClient,
        insights: InsightClient,
        options: PipelineOptions,
    ) -> Self {
        Self {
            reviews,
            insights,
            options,
        }
    }

    /// Builds both clients and the options from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ReviewClient`] or
    /// [`PipelineError::InsightClient`] if a configured URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, PipelineError> {
        let reviews =
            ReviewSourceClient::from_config(config).map_err(PipelineError::ReviewClient)?;
        let insights =
            InsightClient::from_config(config).map_err(PipelineError::InsightClient)?;
        Ok(Self::new(reviews, insights, PipelineOptions::from_config(config)))
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Runs the full pipeline for `app_id`.
    ///
    /// With `generate_insights` false the insight stage is skipped and the
    /// result carries neither `insights` nor `insightError`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SourceUnavailable`] only when the review
    /// fetch fails and sample fallback is disabled. Every insight-stage
    /// failure is reported inside the returned result instead.
    pub async fn run(
        &self,
        app_id: &str,
        generate_insights: bool,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, PipelineError> {
        let mut stage = Stage::FetchingReviews;
        tracing::info!(app_id, generate_insights, "pipeline started");

        let batch = match self.fetch_live(app_id, cancel).await {
            Ok(batch) => batch,
            Err(e) if self.options.sample_fallback => {
                tracing::warn!(app_id, error = %e, "review fetch failed; serving sample batch");
                advance(app_id, &mut stage, Stage::Done);
                return Ok(PipelineResult::reviews_only(sample_batch(
                    &resolve_app_name(app_id),
                )));
            }
            Err(e) => return Err(e),
        };

        if batch.is_empty() {
            advance(app_id, &mut stage, Stage::ReviewsEmpty);
            advance(app_id, &mut stage, Stage::Done);
            return Ok(PipelineResult::reviews_only(batch));
        }

        advance(app_id, &mut stage, Stage::ReviewsReady);
        if !generate_insights {
            advance(app_id, &mut stage, Stage::Done);
            return Ok(PipelineResult::reviews_only(batch));
        }

        advance(app_id, &mut stage, Stage::GeneratingInsights);
        let outcome = self
            .insights
            .analyze(
                &batch.app_name,
                &batch.reviews,
                self.options.sample_size,
                &self.options.llm_policy,
                cancel,
            )
            .await;

        let result = match outcome {
            Ok(mut insights) => {
                if self.options.normalize_sentiment {
                    insights.sentiment_analysis = insights.sentiment_analysis.renormalized();
                }
                advance(app_id, &mut stage, Stage::InsightsReady);
                PipelineResult::with_insights(batch, insights)
            }
            Err(e) => {
                tracing::warn!(
                    app_id,
                    error = %e,
                    "insight generation failed; returning reviews only"
                );
                advance(app_id, &mut stage, Stage::InsightsFailed);
                PipelineResult::with_insight_error(batch, e.to_string())
            }
        };

        advance(app_id, &mut stage, Stage::Done);
        Ok(result)
    }

    /// Fetches the review batch only, degrading to the sample batch like
    /// [`Pipeline::run`] does.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::SourceUnavailable`] when the fetch fails and
    /// sample fallback is disabled.
    pub async fn reviews(
        &self,
        app_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ReviewBatch, PipelineError> {
        Ok(self.run(app_id, false, cancel).await?.into_review_batch())
    }

    /// Fetches reviews and renders the analysis prompt without calling the
    /// LLM. `sample_size` overrides the configured cap.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::reviews`].
    pub async fn prompt(
        &self,
        app_id: &str,
        sample_size: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<AnalysisPrompt, PipelineError> {
        let batch = self.reviews(app_id, cancel).await?;
        let cap = sample_size.unwrap_or(self.options.sample_size);
        Ok(build_prompt(&batch.app_name, &batch.reviews, cap))
    }

    async fn fetch_live(
        &self,
        app_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ReviewBatch, PipelineError> {
        self.reviews
            .fetch_reviews(app_id, &self.options.review_policy, cancel)
            .await
            .map_err(|source| PipelineError::SourceUnavailable {
                app_id: app_id.to_owned(),
                source,
            })
    }
}

fn advance(app_id: &str, stage: &mut Stage, next: Stage) {
    debug_assert!(stage.can_advance_to(next), "illegal transition {stage} -> {next}");
    tracing::debug!(app_id, from = %stage, to = %next, "pipeline stage");
    *stage = next;
}
