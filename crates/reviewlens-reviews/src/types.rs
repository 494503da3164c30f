//! Review-source response types.
//!
//! Every field is optional and loosely typed: sources disagree on whether
//! ids and scores are strings or numbers. These types stop at the
//! normalizer; nothing downstream sees them.

use serde::Deserialize;
use serde_json::Value;

/// Envelope returned by the review source: `{ "reviews": [ ... ] }`.
///
/// Entries stay as raw JSON so one malformed record cannot fail the batch.
#[derive(Debug, Deserialize)]
pub(crate) struct ReviewsResponse {
    pub reviews: Vec<Value>,
}

/// One review record as supplied by the source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub user_name: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    /// 0-based position in the source's `reviews` array, counting entries
    /// that were skipped. Set by the client, never read from the wire.
    #[serde(skip)]
    pub source_index: Option<usize>,
}
