//! Fixed placeholder batch served when the review source is unavailable.

use chrono::{DateTime, Utc};
use reviewlens_core::{BatchSource, Review, ReviewBatch};

/// 2024-01-15T00:00:00Z; sample dates count forward one day per review.
const SAMPLE_EPOCH_SECS: i64 = 1_705_276_800;
const SECS_PER_DAY: i64 = 86_400;

const SAMPLE_REVIEWS: [(u8, &str, &str); 5] = [
    (
        5,
        "Love this app! It does exactly what I need and the interface is clean.",
        "Sample User 1",
    ),
    (
        4,
        "Pretty good overall, but it occasionally lags when loading content.",
        "Sample User 2",
    ),
    (
        3,
        "Decent features, though the latest update made navigation confusing.",
        "Sample User 3",
    ),
    (
        2,
        "Crashes frequently on my device and support has been slow to respond.",
        "Sample User 4",
    ),
    (
        4,
        "Useful app. Would love to see a dark mode and offline support.",
        "Sample User 5",
    ),
];

/// Builds the deterministic five-review sample batch for `app_name`.
///
/// Ratings span 2–5. The batch is tagged [`BatchSource::Sample`] and carries
/// no fetch timing.
#[must_use]
pub fn sample_batch(app_name: &str) -> ReviewBatch {
    let reviews = SAMPLE_REVIEWS
        .iter()
        .zip(0i64..)
        .map(|(&(rating, text, author), day)| Review {
            id: format!("sample-{}", day + 1),
            rating,
            text: text.to_string(),
            author: author.to_string(),
            date: DateTime::from_timestamp(SAMPLE_EPOCH_SECS + day * SECS_PER_DAY, 0)
                .unwrap_or_default(),
        })
        .collect();

    ReviewBatch {
        app_name: app_name.to_string(),
        source: BatchSource::Sample,
        reviews,
        fetch_timing: None,
    }
}
