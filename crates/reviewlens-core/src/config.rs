use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` instead of `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let env = parse_environment(&or_default("REVIEWLENS_ENV", "development"))?;

    let bind_addr: SocketAddr = parse_var(&lookup, "REVIEWLENS_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("REVIEWLENS_LOG_LEVEL", "info");
    let user_agent = or_default("REVIEWLENS_USER_AGENT", "reviewlens/0.1 (review-insights)");

    let review_source_url = require("REVIEWLENS_REVIEW_SOURCE_URL")?;
    let review_timeout_secs: u64 = parse_var(&lookup, "REVIEWLENS_REVIEW_TIMEOUT_SECS", "30")?;
    let review_max_attempts: u32 = parse_var(&lookup, "REVIEWLENS_REVIEW_MAX_ATTEMPTS", "3")?;

    let llm_url = or_default(
        "REVIEWLENS_LLM_URL",
        "https://api.openai.com/v1/chat/completions",
    );
    let llm_api_key = lookup("REVIEWLENS_LLM_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    let llm_model = or_default("REVIEWLENS_LLM_MODEL", "gpt-4o-mini");
    let llm_timeout_secs: u64 = parse_var(&lookup, "REVIEWLENS_LLM_TIMEOUT_SECS", "120")?;
    let llm_max_attempts: u32 = parse_var(&lookup, "REVIEWLENS_LLM_MAX_ATTEMPTS", "1")?;

    let retry_initial_delay_ms: u64 =
        parse_var(&lookup, "REVIEWLENS_RETRY_INITIAL_DELAY_MS", "1000")?;
    let retry_backoff_multiplier: u32 =
        parse_var(&lookup, "REVIEWLENS_RETRY_BACKOFF_MULTIPLIER", "2")?;

    let sample_size: usize = parse_var(&lookup, "REVIEWLENS_SAMPLE_SIZE", "500")?;
    reject_zero("REVIEWLENS_SAMPLE_SIZE", sample_size == 0)?;

    let sample_fallback: bool = parse_var(&lookup, "REVIEWLENS_SAMPLE_FALLBACK", "true")?;
    let normalize_sentiment: bool = parse_var(&lookup, "REVIEWLENS_NORMALIZE_SENTIMENT", "false")?;

    let rate_limit_max_requests: usize =
        parse_var(&lookup, "REVIEWLENS_RATE_LIMIT_MAX_REQUESTS", "120")?;
    let rate_limit_window_secs: u64 =
        parse_var(&lookup, "REVIEWLENS_RATE_LIMIT_WINDOW_SECS", "60")?;
    reject_zero("REVIEWLENS_RATE_LIMIT_MAX_REQUESTS", rate_limit_max_requests == 0)?;
    reject_zero("REVIEWLENS_RATE_LIMIT_WINDOW_SECS", rate_limit_window_secs == 0)?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        user_agent,
        review_source_url,
        review_timeout_secs,
        review_max_attempts,
        llm_url,
        llm_api_key,
        llm_model,
        llm_timeout_secs,
        llm_max_attempts,
        retry_initial_delay_ms,
        retry_backoff_multiplier,
        sample_size,
        sample_fallback,
        normalize_sentiment,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse `var` (or `default` when unset) into `T`, mapping failures to
/// [`ConfigError::InvalidEnvVar`].
fn parse_var<T, F>(lookup: &F, var: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let raw = lookup(var).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn reject_zero(var: &str, is_zero: bool) -> Result<(), ConfigError> {
    if is_zero {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVIEWLENS_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
