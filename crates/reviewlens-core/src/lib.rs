//! Shared domain types, configuration, and cross-cutting helpers for the
//! review-to-insight pipeline.

pub mod app_config;
pub mod app_name;
pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use app_name::resolve_app_name;
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use retry::{retry_with_backoff, RetryPolicy, Transient};
pub use types::{
    BatchSource, FetchTiming, Insights, PipelineResult, Review, ReviewBatch, SentimentAnalysis,
    ANONYMOUS_AUTHOR,
};
