//! HTTP client for the third-party review source.
//!
//! One `GET {base_url}?appId={app_id}` per attempt. Non-2xx statuses and
//! bodies that are not `{ "reviews": [...] }` are typed errors; retrying is
//! layered on top via [`reviewlens_core::retry_with_backoff`].

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Url};
use reviewlens_core::{
    resolve_app_name, retry_with_backoff, AppConfig, BatchSource, FetchTiming, RetryPolicy,
    ReviewBatch,
};
use tokio_util::sync::CancellationToken;

use crate::error::ReviewSourceError;
use crate::normalize::normalize_reviews;
use crate::types::{RawReview, ReviewsResponse};

const APP_ID_PARAM: &str = "appId";

/// Longest slice of an error body kept for diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for the review source.
pub struct ReviewSourceClient {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ReviewSourceClient {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewSourceError::InvalidBaseUrl`] if `base_url` does not
    /// parse, or [`ReviewSourceError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ReviewSourceError> {
        let parsed = Url::parse(base_url).map_err(|e| ReviewSourceError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed,
            timeout_secs,
        })
    }

    /// Creates a client from the review-source settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`ReviewSourceClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ReviewSourceError> {
        Self::new(
            &config.review_source_url,
            config.review_timeout_secs,
            &config.user_agent,
        )
    }

    /// Fetches, normalizes and names the reviews for `app_id`, retrying
    /// transient failures per `policy`.
    ///
    /// An empty review list is a successful, empty batch.
    ///
    /// # Errors
    ///
    /// Returns the last [`ReviewSourceError`] once retries are exhausted or a
    /// non-transient error occurs.
    pub async fn fetch_reviews(
        &self,
        app_id: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<ReviewBatch, ReviewSourceError> {
        let start = Utc::now();
        let raw = retry_with_backoff(policy, cancel, || self.fetch_raw_reviews(app_id)).await?;
        let end = Utc::now();

        let reviews = normalize_reviews(&raw, end);
        let timing = FetchTiming::between(start, end);
        tracing::info!(
            app_id,
            count = reviews.len(),
            duration_ms = timing.duration_ms,
            "fetched reviews"
        );

        Ok(ReviewBatch {
            app_name: resolve_app_name(app_id),
            source: BatchSource::Live,
            reviews,
            fetch_timing: Some(timing),
        })
    }

    /// Performs a single request and returns the raw records.
    ///
    /// Entries that are not JSON objects are skipped.
    ///
    /// # Errors
    ///
    /// - [`ReviewSourceError::Timeout`] when the request exceeds the deadline.
    /// - [`ReviewSourceError::Http`] on any other network failure.
    /// - [`ReviewSourceError::UnexpectedStatus`] for a non-2xx status.
    /// - [`ReviewSourceError::Deserialize`] if the body is not the expected shape.
    pub async fn fetch_raw_reviews(
        &self,
        app_id: &str,
    ) -> Result<Vec<RawReview>, ReviewSourceError> {
        let url = self.reviews_url(app_id);
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ReviewSourceError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let envelope: ReviewsResponse =
            serde_json::from_str(&body).map_err(|e| ReviewSourceError::Deserialize {
                context: format!("reviews for {app_id}"),
                source: e,
            })?;

        let total = envelope.reviews.len();
        let raw: Vec<RawReview> = envelope
            .reviews
            .into_iter()
            .enumerate()
            .filter_map(|(index, v)| {
                serde_json::from_value::<RawReview>(v)
                    .ok()
                    .map(|record| RawReview {
                        source_index: Some(index),
                        ..record
                    })
            })
            .collect();
        if raw.len() != total {
            tracing::warn!(
                app_id,
                skipped = total - raw.len(),
                "skipped review entries that are not objects"
            );
        }

        Ok(raw)
    }

    /// Builds `{base_url}?appId={app_id}` with the identifier percent-encoded.
    fn reviews_url(&self, app_id: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair(APP_ID_PARAM, app_id);
        url
    }

    fn map_send_error(&self, err: reqwest::Error) -> ReviewSourceError {
        if err.is_timeout() {
            ReviewSourceError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            ReviewSourceError::Http(err)
        }
    }
}

fn truncate_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}
