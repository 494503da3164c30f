//! Review-to-insight orchestration.
//!
//! [`Pipeline::run`] fetches reviews, degrades to the fixed sample batch
//! when the source is down, and downgrades every insight-stage failure to
//! an `insightError` string so fetched reviews are always returned.

pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineOptions};
pub use stage::Stage;
