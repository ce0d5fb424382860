//! API Key Resolution
//!
//! The Gemini key comes from `GEMINI_API_KEY` if set, otherwise from the
//! config file's `api_key`.

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Where the resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    ConfigFile,
}

/// Resolve the API key from the process environment and `config`.
pub fn resolve_api_key(config: &AppConfig) -> AppResult<(String, KeySource)> {
    resolve_api_key_from(std::env::var(API_KEY_ENV).ok(), config)
}

/// Resolve the API key given the environment value.
pub fn resolve_api_key_from(
    env_value: Option<String>,
    config: &AppConfig,
) -> AppResult<(String, KeySource)> {
    if let Some(key) = non_blank(env_value) {
        return Ok((key, KeySource::Environment));
    }
    if let Some(key) = non_blank(config.api_key.clone()) {
        return Ok((key, KeySource::ConfigFile));
    }
    Err(AppError::config(format!(
        "no Gemini API key: set {} or api_key in the config file",
        API_KEY_ENV
    )))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
