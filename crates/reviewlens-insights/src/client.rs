//! Client for an OpenAI-compatible chat-completions endpoint.
//!
//! One request carries the system instruction, the rendered prompt, and a
//! `json_object` response format. The whole round-trip runs under a
//! deadline; expiry is reported as [`InsightError::Timeout`], separate from
//! other network failures.

use std::time::Duration;

use reqwest::{Client, Url};
use reviewlens_core::{retry_with_backoff, AppConfig, Insights, RetryPolicy, Review};
use tokio_util::sync::CancellationToken;

use crate::error::InsightError;
use crate::parse::parse_insights;
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};

/// Longest slice of an error body kept for diagnostics.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Values commonly left in `.env` templates instead of a real key.
const PLACEHOLDER_KEYS: &[&str] = &["changeme", "placeholder", "xxx", "none", "null"];

/// Client for the LLM provider.
pub struct InsightClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
}

impl InsightClient {
    /// Creates a client for `endpoint`.
    ///
    /// An absent or placeholder `api_key` is accepted here; requests then
    /// fail fast with [`InsightError::MissingCredential`].
    ///
    /// # Errors
    ///
    /// Returns [`InsightError::InvalidEndpoint`] if `endpoint` does not parse,
    /// or [`InsightError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        endpoint: &str,
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, InsightError> {
        let parsed = Url::parse(endpoint).map_err(|e| InsightError::InvalidEndpoint {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: parsed,
            api_key: api_key.map(str::to_owned),
            model: model.to_owned(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Creates a client from the LLM settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`InsightClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, InsightError> {
        Self::new(
            &config.llm_url,
            config.llm_api_key.as_deref(),
            &config.llm_model,
            config.llm_timeout_secs,
            &config.user_agent,
        )
    }

    /// Whether a usable API key is configured.
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Runs the whole insight stage for `reviews`: build the prompt from the
    /// first `sample_size` reviews, call the model, parse the reply.
    ///
    /// # Errors
    ///
    /// - [`InsightError::NoReviews`] if `reviews` is empty.
    /// - [`InsightError::MissingCredential`] before any request is sent.
    /// - Any error from [`InsightClient::complete`] or [`parse_insights`].
    pub async fn analyze(
        &self,
        app_name: &str,
        reviews: &[Review],
        sample_size: usize,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Insights, InsightError> {
        if reviews.is_empty() {
            return Err(InsightError::NoReviews);
        }
        if !self.has_credential() {
            return Err(InsightError::MissingCredential);
        }

        let prompt = build_prompt(app_name, reviews, sample_size);
        tracing::debug!(
            app_name,
            sample_size = prompt.sample_size,
            mean_rating = prompt.mean_rating,
            prompt_chars = prompt.text.len(),
            "built analysis prompt"
        );

        let content = self.complete(app_name, &prompt.text, policy, cancel).await?;
        parse_insights(&content).inspect_err(|e| {
            if let InsightError::MalformedInsights { raw, .. } = e {
                tracing::warn!(
                    app_name,
                    raw_chars = raw.len(),
                    error = %e,
                    "model reply did not parse"
                );
            }
        })
    }

    /// Sends `prompt` and returns the first choice's message content,
    /// retrying transient failures per `policy`.
    ///
    /// # Errors
    ///
    /// - [`InsightError::MissingCredential`] if no usable key is configured.
    /// - [`InsightError::Timeout`] if the deadline expires.
    /// - [`InsightError::ProviderError`] for a non-2xx status.
    /// - [`InsightError::EmptyResponse`] if the first choice has no content.
    /// - [`InsightError::Deserialize`] if the envelope is not chat-completions shaped.
    /// - [`InsightError::Http`] on other network failures.
    pub async fn complete(
        &self,
        app_name: &str,
        prompt: &str,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<String, InsightError> {
        let api_key = self.credential().ok_or(InsightError::MissingCredential)?;
        tracing::info!(app_name, model = %self.model, "requesting insights from LLM");

        retry_with_backoff(policy, cancel, || self.request_once(api_key, prompt)).await
    }

    async fn request_once(&self, api_key: &str, prompt: &str) -> Result<String, InsightError> {
        let timeout_secs = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, self.send(api_key, prompt)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(InsightError::Timeout { timeout_secs }),
        }
    }

    async fn send(&self, api_key: &str, prompt: &str) -> Result<String, InsightError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat::JSON_OBJECT,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "LLM provider returned an error status");
            return Err(InsightError::ProviderError {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let envelope: ChatResponse =
            serde_json::from_str(&body).map_err(|e| InsightError::Deserialize { source: e })?;
        envelope.first_content().ok_or(InsightError::EmptyResponse)
    }

    fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !is_placeholder_key(key))
    }
}

/// Blank keys, template values, and `your...key` style hints count as unset.
fn is_placeholder_key(key: &str) -> bool {
    let lower = key.trim().to_ascii_lowercase();
    lower.is_empty()
        || PLACEHOLDER_KEYS.contains(&lower.as_str())
        || (lower.starts_with("your") && lower.contains("key"))
        || lower.starts_with('<')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_key(key: Option<&str>) -> InsightClient {
        InsightClient::new(
            "https://llm.example.com/v1/chat/completions",
            key,
            "test-model",
            120,
            "reviewlens-test/0.1",
        )
        .expect("client construction should not fail")
    }

    #[test]
    fn placeholder_keys_are_detected() {
        for key in [
            "",
            "   ",
            "changeme",
            "YOUR_API_KEY",
            "your-openai-key-here",
            "<api-key>",
        ] {
            assert!(is_placeholder_key(key), "{key:?} should be a placeholder");
        }
        assert!(!is_placeholder_key("sk-proj-abc123"));
    }

    #[test]
    fn has_credential_reflects_key() {
        assert!(client_with_key(Some("sk-real")).has_credential());
        assert!(!client_with_key(None).has_credential());
        assert!(!client_with_key(Some("your_api_key")).has_credential());
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = InsightClient::new("::nope::", Some("k"), "m", 10, "ua");
        assert!(matches!(result, Err(InsightError::InvalidEndpoint { .. })));
    }

    #[test]
    fn chat_request_serializes_expected_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_INSTRUCTION,
                },
                ChatMessage {
                    role: "user",
                    content: "prompt",
                },
            ],
            response_format: ResponseFormat::JSON_OBJECT,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "prompt");
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn analyze_without_reviews_fails_before_credential_check() {
        let client = client_with_key(None);
        let err = client
            .analyze(
                "App",
                &[],
                500,
                &RetryPolicy::immediate(1),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InsightError::NoReviews));
    }
}
