//! Review-source client and normalization into canonical [`Review`]s.
//!
//! [`Review`]: reviewlens_core::Review

pub mod client;
pub mod error;
pub mod normalize;
pub mod sample;
pub mod types;

pub use client::ReviewSourceClient;
pub use error::ReviewSourceError;
pub use normalize::{normalize_review, normalize_reviews};
pub use sample::sample_batch;
pub use types::RawReview;
