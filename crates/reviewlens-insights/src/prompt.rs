//! Deterministic rendering of a review sample into the analysis prompt.
//!
//! The JSON shape at the end of the prompt is the only contract the model
//! gets; [`crate::parse`] relies on these exact field names.

use reviewlens_core::Review;

/// Sample cap for the primary path. Latency-sensitive callers may pass a
/// smaller one (e.g. 100).
pub const DEFAULT_SAMPLE_SIZE: usize = 500;

/// System message sent alongside every prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert app review analyst. \
You read user reviews and extract concise, actionable product insights. \
Always respond with a single valid JSON object and nothing else.";

const INSTRUCTIONS: &str = "Based on these reviews, provide:
1. Common praises: the 3-5 things users like most.
2. Common complaints: the 3-5 problems users report most often.
3. Feature requests: the 3-5 features users ask for most.
4. User experience: one paragraph summarizing the overall user experience.
5. Sentiment analysis: the percentage of positive and negative sentiment, and the key emotions users express.
6. Actionable recommendations: three concrete recommendations for the development team.";

const RESPONSE_SHAPE: &str = r#"Respond with a single JSON object in exactly this format:
{
  "commonPraises": ["praise 1", "praise 2", "praise 3"],
  "commonComplaints": ["complaint 1", "complaint 2", "complaint 3"],
  "featureRequests": ["request 1", "request 2", "request 3"],
  "userExperience": "A paragraph describing the overall user experience.",
  "sentimentAnalysis": {
    "positivePercentage": 70,
    "negativePercentage": 30,
    "keyEmotions": ["emotion 1", "emotion 2", "emotion 3"]
  },
  "actionableRecommendations": ["recommendation 1", "recommendation 2", "recommendation 3"]
}"#;

/// Counts of 1–5 star ratings. Ratings outside 1–5 are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingHistogram {
    counts: [usize; 5],
}

impl RatingHistogram {
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut counts = [0usize; 5];
        for review in reviews {
            if (1..=5).contains(&review.rating) {
                counts[usize::from(review.rating) - 1] += 1;
            }
        }
        Self { counts }
    }

    /// Number of reviews with exactly `stars` stars; `0` for anything
    /// outside 1–5.
    #[must_use]
    pub fn count(&self, stars: u8) -> usize {
        match stars {
            1..=5 => self.counts[usize::from(stars) - 1],
            _ => 0,
        }
    }

    /// Reviews counted across all five buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// A rendered prompt plus the statistics it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPrompt {
    pub text: String,
    /// Reviews included after truncation.
    pub sample_size: usize,
    pub mean_rating: f64,
    pub histogram: RatingHistogram,
}

/// The first `cap` reviews, in their original order.
#[must_use]
pub fn sample_reviews(reviews: &[Review], cap: usize) -> &[Review] {
    &reviews[..reviews.len().min(cap)]
}

/// Arithmetic mean of every rating in `reviews`; `0.0` when empty.
#[must_use]
pub fn mean_rating(reviews: &[Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)]
    let count = reviews.len() as f64;
    f64::from(sum) / count
}

/// Renders a review as `[Rating: R/5] "text" - author, YYYY-MM-DD`.
#[must_use]
pub fn render_review(review: &Review) -> String {
    format!(
        "[Rating: {}/5] \"{}\" - {}, {}",
        review.rating,
        review.text,
        review.author,
        review.date.format("%Y-%m-%d")
    )
}

/// Builds the analysis prompt for the first `cap` of `reviews`.
///
/// Identical inputs always yield byte-identical text.
#[must_use]
pub fn build_prompt(app_name: &str, reviews: &[Review], cap: usize) -> AnalysisPrompt {
    let sample = sample_reviews(reviews, cap);
    let histogram = RatingHistogram::from_reviews(sample);
    let mean = mean_rating(sample);

    let mut text = String::new();
    text.push_str(&format!(
        "Analyze the following user reviews for the app \"{app_name}\".\n\n"
    ));
    text.push_str(&format!(
        "Average rating: {mean:.2}/5 across {} sampled reviews\n",
        sample.len()
    ));
    text.push_str("Rating distribution:\n");
    for stars in (1..=5u8).rev() {
        let label = if stars == 1 { "star" } else { "stars" };
        text.push_str(&format!(
            "- {stars} {label}: {}\n",
            histogram.count(stars)
        ));
    }

    text.push_str("\nReviews:\n\n");
    let rendered: Vec<String> = sample.iter().map(render_review).collect();
    text.push_str(&rendered.join("\n\n"));

    text.push_str("\n\n");
    text.push_str(INSTRUCTIONS);
    text.push_str("\n\n");
    text.push_str(RESPONSE_SHAPE);

    AnalysisPrompt {
        text,
        sample_size: sample.len(),
        mean_rating: mean,
        histogram,
    }
}
