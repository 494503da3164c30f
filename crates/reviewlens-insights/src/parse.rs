//! Best-effort parsing of the model's reply into [`Insights`].
//!
//! The reply is cleaned (code fence, bold markers, whitespace), parsed as
//! JSON, and converted key by key. Missing or mistyped keys fall back to
//! empty lists, an empty string, or zero percentages; only text that is not
//! a JSON object after cleanup is rejected.

use std::sync::LazyLock;

use regex::Regex;
use reviewlens_core::{Insights, SentimentAnalysis};
use serde_json::Value;

use crate::error::InsightError;
use crate::types::RawInsights;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[\w-]*[ \t]*\r?\n?").expect("valid opening fence regex"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n?```\s*$").expect("valid closing fence regex"));

/// Strips a surrounding Markdown code fence and `**` bold markers, then
/// trims whitespace.
#[must_use]
pub fn clean_model_output(raw: &str) -> String {
    let trimmed = raw.trim();
    let unfenced = OPENING_FENCE.replace(trimmed, "");
    let unfenced = CLOSING_FENCE.replace(&unfenced, "");
    unfenced.replace("**", "").trim().to_string()
}

/// Parses the raw content string returned by the LLM.
///
/// # Errors
///
/// Returns [`InsightError::MalformedInsights`] if the cleaned text is not a
/// JSON object. The error keeps `raw` unmodified.
pub fn parse_insights(raw: &str) -> Result<Insights, InsightError> {
    let malformed = |reason: String| InsightError::MalformedInsights {
        reason,
        raw: raw.to_string(),
    };

    let cleaned = clean_model_output(raw);
    let value: Value = serde_json::from_str(&cleaned).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    let boundary: RawInsights =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
    Ok(into_insights(boundary))
}

fn into_insights(raw: RawInsights) -> Insights {
    let sentiment = raw.sentiment_analysis.as_ref();
    Insights {
        common_praises: string_list(raw.common_praises.as_ref()),
        common_complaints: string_list(raw.common_complaints.as_ref()),
        feature_requests: string_list(raw.feature_requests.as_ref()),
        user_experience: raw
            .user_experience
            .as_ref()
            .and_then(scalar_text)
            .unwrap_or_default(),
        sentiment_analysis: SentimentAnalysis {
            positive_percentage: percentage(sentiment.and_then(|s| s.get("positivePercentage"))),
            negative_percentage: percentage(sentiment.and_then(|s| s.get("negativePercentage"))),
            key_emotions: string_list(sentiment.and_then(|s| s.get("keyEmotions"))),
        },
        actionable_recommendations: string_list(raw.actionable_recommendations.as_ref()),
    }
}

/// Arrays keep their scalar items as text; a lone string becomes a
/// one-item list; anything else is empty.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numbers pass through untouched; strings like `"72%"` are parsed.
/// Anything else, or a non-finite value, is `0.0`.
fn percentage(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
