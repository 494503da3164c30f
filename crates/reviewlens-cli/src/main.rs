mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "reviewlens-cli")]
#[command(about = "Fetch app reviews and turn them into product insights")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch reviews and generate insights; prints the result as JSON
    Analyze {
        /// Application identifier, e.g. `com.spotify.music`
        app_id: String,
        /// Skip the LLM call and return reviews only
        #[arg(long)]
        no_insights: bool,
    },
    /// Fetch and normalize reviews; prints the batch as JSON
    Reviews { app_id: String },
    /// Print the analysis prompt that would be sent to the LLM
    Prompt {
        app_id: String,
        /// Override the configured review sample cap
        #[arg(long, value_parser = parse_sample_size)]
        sample_size: Option<usize>,
    },
    /// Print the display name derived from an application identifier
    ResolveName { app_id: String },
}

fn parse_sample_size(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("sample size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Filter used when `RUST_LOG` is unset: `REVIEWLENS_LOG_LEVEL`, else `warn`
/// so stdout stays clean for JSON output.
fn log_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("REVIEWLENS_LOG_LEVEL")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "warn".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_directive(|key| std::env::var(key))))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            app_id,
            no_insights,
        } => commands::run_analyze(&app_id, !no_insights).await,
        Commands::Reviews { app_id } => commands::run_reviews(&app_id).await,
        Commands::Prompt {
            app_id,
            sample_size,
        } => commands::run_prompt(&app_id, sample_size).await,
        Commands::ResolveName { app_id } => {
            println!("{}", reviewlens_core::resolve_app_name(&app_id));
            Ok(())
        }
    }
}
