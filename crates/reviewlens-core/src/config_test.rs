use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

/// Returns a map with all required env vars populated with valid defaults.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("REVIEWLENS_REVIEW_SOURCE_URL", "http://reviews.local/api");
    m
}

#[test]
fn parse_environment_known_values() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
    assert_eq!(parse_environment("test").unwrap(), Environment::Test);
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "REVIEWLENS_ENV"));
}

#[test]
fn build_app_config_fails_without_review_source_url() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "REVIEWLENS_REVIEW_SOURCE_URL"),
        "expected MissingEnvVar(REVIEWLENS_REVIEW_SOURCE_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_review_source_url_as_missing() {
    let mut map = HashMap::new();
    map.insert("REVIEWLENS_REVIEW_SOURCE_URL", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(_))));
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.user_agent, "reviewlens/0.1 (review-insights)");
    assert_eq!(cfg.review_source_url, "http://reviews.local/api");
    assert_eq!(cfg.review_timeout_secs, 30);
    assert_eq!(cfg.review_max_attempts, 3);
    assert_eq!(cfg.llm_url, "https://api.openai.com/v1/chat/completions");
    assert!(cfg.llm_api_key.is_none());
    assert_eq!(cfg.llm_model, "gpt-4o-mini");
    assert_eq!(cfg.llm_timeout_secs, 120);
    assert_eq!(cfg.llm_max_attempts, 1);
    assert_eq!(cfg.retry_initial_delay_ms, 1000);
    assert_eq!(cfg.retry_backoff_multiplier, 2);
    assert_eq!(cfg.sample_size, 500);
    assert!(cfg.sample_fallback);
    assert!(!cfg.normalize_sentiment);
    assert_eq!(cfg.rate_limit_max_requests, 120);
    assert_eq!(cfg.rate_limit_window_secs, 60);
}

#[test]
fn build_app_config_reads_overrides() {
    let mut map = full_env();
    map.insert("REVIEWLENS_ENV", "production");
    map.insert("REVIEWLENS_LLM_API_KEY", " sk-live ");
    map.insert("REVIEWLENS_LLM_TIMEOUT_SECS", "60");
    map.insert("REVIEWLENS_SAMPLE_SIZE", "100");
    map.insert("REVIEWLENS_SAMPLE_FALLBACK", "false");
    map.insert("REVIEWLENS_NORMALIZE_SENTIMENT", "true");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Production);
    assert_eq!(cfg.llm_api_key.as_deref(), Some("sk-live"));
    assert_eq!(cfg.llm_timeout_secs, 60);
    assert_eq!(cfg.sample_size, 100);
    assert!(!cfg.sample_fallback);
    assert!(cfg.normalize_sentiment);
}

#[test]
fn build_app_config_treats_blank_api_key_as_absent() {
    let mut map = full_env();
    map.insert("REVIEWLENS_LLM_API_KEY", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.llm_api_key.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = full_env();
    map.insert("REVIEWLENS_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVIEWLENS_BIND_ADDR"),
        "expected InvalidEnvVar(REVIEWLENS_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_llm_timeout() {
    let mut map = full_env();
    map.insert("REVIEWLENS_LLM_TIMEOUT_SECS", "two minutes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVIEWLENS_LLM_TIMEOUT_SECS"),
        "expected InvalidEnvVar(REVIEWLENS_LLM_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_zero_sample_size() {
    let mut map = full_env();
    map.insert("REVIEWLENS_SAMPLE_SIZE", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVIEWLENS_SAMPLE_SIZE"),
        "expected InvalidEnvVar(REVIEWLENS_SAMPLE_SIZE), got: {result:?}"
    );
}

#[test]
fn build_app_config_rejects_non_boolean_fallback_flag() {
    let mut map = full_env();
    map.insert("REVIEWLENS_SAMPLE_FALLBACK", "yes");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "REVIEWLENS_SAMPLE_FALLBACK"
    ));
}

#[test]
fn retry_policies_follow_config() {
    let mut map = full_env();
    map.insert("REVIEWLENS_REVIEW_MAX_ATTEMPTS", "5");
    map.insert("REVIEWLENS_LLM_MAX_ATTEMPTS", "2");
    map.insert("REVIEWLENS_RETRY_INITIAL_DELAY_MS", "250");
    map.insert("REVIEWLENS_RETRY_BACKOFF_MULTIPLIER", "3");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();

    let review = cfg.review_retry_policy();
    assert_eq!(review.max_attempts, 5);
    assert_eq!(review.initial_delay.as_millis(), 250);
    assert_eq!(review.multiplier, 3);

    let llm = cfg.llm_retry_policy();
    assert_eq!(llm.max_attempts, 2);
}

#[test]
fn debug_output_redacts_api_key() {
    let mut map = full_env();
    map.insert("REVIEWLENS_LLM_API_KEY", "sk-very-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sk-very-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn build_app_config_reads_rate_limit_settings() {
    let mut map = full_env();
    map.insert("REVIEWLENS_RATE_LIMIT_MAX_REQUESTS", "30");
    map.insert("REVIEWLENS_RATE_LIMIT_WINDOW_SECS", "10");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.rate_limit_max_requests, 30);
    assert_eq!(cfg.rate_limit_window_secs, 10);
}

#[test]
fn build_app_config_rejects_zero_rate_limit() {
    for var in [
        "REVIEWLENS_RATE_LIMIT_MAX_REQUESTS",
        "REVIEWLENS_RATE_LIMIT_WINDOW_SECS",
    ] {
        let mut map = full_env();
        map.insert(var, "0");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { var: ref v, .. }) if v == var),
            "expected InvalidEnvVar({var}), got: {result:?}"
        );
    }
}
