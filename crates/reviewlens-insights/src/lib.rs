//! Insight stage: prompt construction, the LLM chat-completions client, and
//! parsing of the model's reply into [`Insights`].
//!
//! [`Insights`]: reviewlens_core::Insights

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;

mod types;

pub use client::InsightClient;
pub use error::InsightError;
pub use parse::{clean_model_output, parse_insights};
pub use prompt::{
    build_prompt, AnalysisPrompt, RatingHistogram, DEFAULT_SAMPLE_SIZE, SYSTEM_INSTRUCTION,
};
