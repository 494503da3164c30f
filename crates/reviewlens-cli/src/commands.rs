//! Command handlers. Each loads configuration, builds the pipeline, and
//! writes its result to stdout; logs go to stderr.

use reviewlens_pipeline::Pipeline;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

fn build_pipeline() -> anyhow::Result<Pipeline> {
    let config = reviewlens_core::load_app_config()?;
    tracing::debug!(?config, "loaded configuration");
    Ok(Pipeline::from_config(&config)?)
}

/// Token cancelled on ctrl-c so pending retry sleeps stop early.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; cancelling pending requests");
            child.cancel();
        }
    });
    token
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) async fn run_analyze(app_id: &str, generate_insights: bool) -> anyhow::Result<()> {
    let pipeline = build_pipeline()?;
    let result = pipeline
        .run(app_id, generate_insights, &cancel_on_ctrl_c())
        .await?;
    if let Some(error) = result.insight_error() {
        tracing::warn!(app_id, error, "insights unavailable");
    }
    print_json(&result)
}

pub(crate) async fn run_reviews(app_id: &str) -> anyhow::Result<()> {
    let pipeline = build_pipeline()?;
    let batch = pipeline.reviews(app_id, &cancel_on_ctrl_c()).await?;
    print_json(&batch)
}

pub(crate) async fn run_prompt(app_id: &str, sample_size: Option<usize>) -> anyhow::Result<()> {
    let pipeline = build_pipeline()?;
    let prompt = pipeline
        .prompt(app_id, sample_size, &cancel_on_ctrl_c())
        .await?;
    tracing::info!(
        app_id,
        sample_size = prompt.sample_size,
        mean_rating = prompt.mean_rating,
        "rendered prompt"
    );
    println!("{}", prompt.text);
    Ok(())
}
