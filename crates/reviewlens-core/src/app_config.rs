use std::net::SocketAddr;
use std::time::Duration;

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide settings, built once at startup and shared read-only.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub user_agent: String,
    pub review_source_url: String,
    pub review_timeout_secs: u64,
    pub review_max_attempts: u32,
    pub llm_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    pub llm_max_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_backoff_multiplier: u32,
    pub sample_size: usize,
    pub sample_fallback: bool,
    pub normalize_sentiment: bool,
    /// Requests each client may make to the app routes per window.
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
}

impl AppConfig {
    /// Backoff policy wrapped around review-source requests.
    #[must_use]
    pub fn review_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.review_max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            multiplier: self.retry_backoff_multiplier,
            ..RetryPolicy::default()
        }
    }

    /// Backoff policy wrapped around LLM requests.
    #[must_use]
    pub fn llm_retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.llm_max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            multiplier: self.retry_backoff_multiplier,
            ..RetryPolicy::default()
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("user_agent", &self.user_agent)
            .field("review_source_url", &self.review_source_url)
            .field("review_timeout_secs", &self.review_timeout_secs)
            .field("review_max_attempts", &self.review_max_attempts)
            .field("llm_url", &self.llm_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("llm_max_attempts", &self.llm_max_attempts)
            .field("retry_initial_delay_ms", &self.retry_initial_delay_ms)
            .field("retry_backoff_multiplier", &self.retry_backoff_multiplier)
            .field("sample_size", &self.sample_size)
            .field("sample_fallback", &self.sample_fallback)
            .field("normalize_sentiment", &self.normalize_sentiment)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .finish()
    }
}
