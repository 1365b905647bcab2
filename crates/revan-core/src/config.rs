use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AnalysisMode, AppConfig};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable holds an invalid value.
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
/// Returns `ConfigError` if a variable holds an invalid value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; unset variables take their defaults.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let log_level = or_default("REVAN_LOG_LEVEL", "info");
    let ollama_url = or_default("REVAN_OLLAMA_URL", "http://localhost:11434");
    let model = or_default("REVAN_MODEL", "mistral");
    if model.trim().is_empty() {
        return Err(invalid("REVAN_MODEL", "must be non-empty"));
    }

    let temperature: f32 = parse_var(&or_default("REVAN_TEMPERATURE", "0.1"), "REVAN_TEMPERATURE")?;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(invalid("REVAN_TEMPERATURE", "must be between 0.0 and 2.0"));
    }

    let top_p: f32 = parse_var(&or_default("REVAN_TOP_P", "0.9"), "REVAN_TOP_P")?;
    if !(top_p > 0.0 && top_p <= 1.0) {
        return Err(invalid("REVAN_TOP_P", "must be in (0.0, 1.0]"));
    }

    let request_timeout_secs: u64 = parse_var(
        &or_default("REVAN_REQUEST_TIMEOUT_SECS", "30"),
        "REVAN_REQUEST_TIMEOUT_SECS",
    )?;
    if request_timeout_secs == 0 {
        return Err(invalid("REVAN_REQUEST_TIMEOUT_SECS", "must be at least 1"));
    }

    let analysis_mode = parse_analysis_mode(&or_default("REVAN_ANALYSIS_MODE", "combined"))?;

    let summary_max_chars: usize = parse_var(
        &or_default("REVAN_SUMMARY_MAX_CHARS", "200"),
        "REVAN_SUMMARY_MAX_CHARS",
    )?;
    if summary_max_chars < 16 {
        return Err(invalid("REVAN_SUMMARY_MAX_CHARS", "must be at least 16"));
    }

    let max_concurrent_reviews: usize = parse_var(
        &or_default("REVAN_MAX_CONCURRENT_REVIEWS", "1"),
        "REVAN_MAX_CONCURRENT_REVIEWS",
    )?;
    if max_concurrent_reviews == 0 {
        return Err(invalid("REVAN_MAX_CONCURRENT_REVIEWS", "must be at least 1"));
    }

    let inter_request_delay_ms: u64 = parse_var(
        &or_default("REVAN_INTER_REQUEST_DELAY_MS", "0"),
        "REVAN_INTER_REQUEST_DELAY_MS",
    )?;

    let max_retries: u32 = parse_var(&or_default("REVAN_MAX_RETRIES", "0"), "REVAN_MAX_RETRIES")?;
    let retry_backoff_base_ms: u64 = parse_var(
        &or_default("REVAN_RETRY_BACKOFF_BASE_MS", "500"),
        "REVAN_RETRY_BACKOFF_BASE_MS",
    )?;
    let abort_after_consecutive_failures: u32 = parse_var(
        &or_default("REVAN_ABORT_AFTER_CONSECUTIVE_FAILURES", "5"),
        "REVAN_ABORT_AFTER_CONSECUTIVE_FAILURES",
    )?;

    let topics_path = lookup("REVAN_TOPICS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    Ok(AppConfig {
        log_level,
        ollama_url,
        model,
        temperature,
        top_p,
        request_timeout_secs,
        analysis_mode,
        summary_max_chars,
        max_concurrent_reviews,
        inter_request_delay_ms,
        max_retries,
        retry_backoff_base_ms,
        abort_after_consecutive_failures,
        topics_path,
    })
}

fn parse_var<T>(raw: &str, var: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| invalid(var, &e.to_string()))
}

fn invalid(var: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse `REVAN_ANALYSIS_MODE`. Accepts `combined` and `per-field` (or `per_field`).
fn parse_analysis_mode(s: &str) -> Result<AnalysisMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "combined" => Ok(AnalysisMode::Combined),
        "per-field" | "per_field" => Ok(AnalysisMode::PerField),
        other => Err(invalid(
            "REVAN_ANALYSIS_MODE",
            &format!("unknown mode '{other}'; expected combined or per-field"),
        )),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
