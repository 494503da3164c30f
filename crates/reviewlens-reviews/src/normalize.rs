//! Normalization of raw review-source records into canonical [`Review`]s.
//!
//! Each field falls back independently; normalization never fails.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reviewlens_core::{Review, ANONYMOUS_AUTHOR};
use serde_json::Value;

use crate::types::RawReview;

const MAX_RATING: f64 = 5.0;

/// Normalizes a batch in source order. Missing or unparsable dates become
/// `fetched_at`.
///
/// Ids are unique within the returned batch. A missing id becomes the
/// record's 1-based source position; when that (or a repeated source id) is
/// already taken, `-2`, `-3`, ... is appended until it is free. Source
/// supplied ids are never displaced by generated ones.
#[must_use]
pub fn normalize_reviews(raw: &[RawReview], fetched_at: DateTime<Utc>) -> Vec<Review> {
    let supplied: HashSet<String> = raw.iter().filter_map(supplied_id).collect();
    let mut claimed = HashSet::with_capacity(raw.len());

    raw.iter()
        .enumerate()
        .map(|(index, record)| {
            let position = record.source_index.unwrap_or(index);
            let mut review = normalize_review(record, position, fetched_at);
            let is_supplied = supplied_id(record).is_some();
            review.id = claim_id(review.id, is_supplied, &supplied, &mut claimed);
            review
        })
        .collect()
}

/// Normalizes the record at position `index` (0-based) of its batch.
///
/// Id uniqueness is only enforced across a batch by [`normalize_reviews`].
#[must_use]
pub fn normalize_review(raw: &RawReview, index: usize, fetched_at: DateTime<Utc>) -> Review {
    let id = supplied_id(raw).unwrap_or_else(|| (index + 1).to_string());

    let author = raw
        .user_name
        .as_ref()
        .and_then(string_like)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| ANONYMOUS_AUTHOR.to_string());

    Review {
        id,
        rating: parse_rating(raw.score.as_ref()),
        text: raw.text.as_ref().and_then(string_like).unwrap_or_default(),
        author,
        date: raw
            .date
            .as_ref()
            .and_then(parse_review_date)
            .unwrap_or(fetched_at),
    }
}

/// Parses a star rating. Anything missing, non-numeric, or outside 0–5
/// yields `0`; fractional scores round to the nearest star.
#[must_use]
pub fn parse_rating(score: Option<&Value>) -> u8 {
    let value = match score {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match value {
        Some(v) if v.is_finite() && (0.0..=MAX_RATING).contains(&v) => round_to_star(v),
        _ => 0,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_to_star(value: f64) -> u8 {
    value.round() as u8
}

/// Parses RFC 3339 timestamps, naive `YYYY-MM-DD[ T]HH:MM:SS` timestamps
/// (taken as UTC), bare `YYYY-MM-DD` dates, and epoch milliseconds.
#[must_use]
pub fn parse_review_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn supplied_id(raw: &RawReview) -> Option<String> {
    raw.id
        .as_ref()
        .and_then(string_like)
        .filter(|id| !id.trim().is_empty())
}

/// Returns `base` or the first free `base-N`, and records it as claimed.
///
/// A generated candidate must also avoid every id the source supplied,
/// including ones that appear later in the batch.
fn claim_id(
    base: String,
    is_supplied: bool,
    supplied: &HashSet<String>,
    claimed: &mut HashSet<String>,
) -> String {
    let is_free = |candidate: &str, claimed: &HashSet<String>| {
        !claimed.contains(candidate)
            && ((is_supplied && candidate == base) || !supplied.contains(candidate))
    };

    let id = if is_free(&base, claimed) {
        base
    } else {
        (2usize..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| is_free(candidate, claimed))
            .unwrap_or_default()
    };
    claimed.insert(id.clone());
    id
}

fn string_like(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
