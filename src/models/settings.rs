//! Settings Models
//!
//! Application configuration and settings data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mindmate_core::TransportSettings;
use mindmate_llm::{
    GeminiConfig, GenerationConfig, RetryPolicy, DEFAULT_BASE_URL, DEFAULT_MODEL,
};

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gemini model name
    pub model: String,
    /// Models collection URL
    pub base_url: String,
    /// API key; `GEMINI_API_KEY` takes precedence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Attempts per API call, including the first
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_base_secs: f64,
    /// Delay used when a 429 carries an unreadable `Retry-After`
    pub default_rate_limit_delay_secs: f64,
    /// Timeouts and proxy
    pub transport: TransportSettings,
    /// Role used when none is given on the command line
    pub default_role: String,
    /// Language code (e.g., "en", "zh-TW")
    pub language: String,
    /// Enable debug logging
    pub debug_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        let retry = RetryPolicy::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            temperature: generation.temperature,
            top_k: generation.top_k,
            top_p: generation.top_p,
            max_output_tokens: generation.max_output_tokens,
            max_retries: retry.max_retries,
            backoff_base_secs: retry.backoff_base.as_secs_f64(),
            default_rate_limit_delay_secs: retry.default_rate_limit_delay.as_secs_f64(),
            transport: TransportSettings::default(),
            default_role: "therapist".to_string(),
            language: "zh-TW".to_string(),
            debug_mode: false,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub default_role: Option<String>,
    pub language: Option<String>,
    pub debug_mode: Option<bool>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(base_url) = update.base_url {
            self.base_url = base_url;
        }
        if let Some(api_key) = update.api_key {
            // An empty key clears the stored one
            self.api_key = Some(api_key).filter(|k| !k.trim().is_empty());
        }
        if let Some(temperature) = update.temperature {
            self.temperature = temperature;
        }
        if let Some(max_output_tokens) = update.max_output_tokens {
            self.max_output_tokens = max_output_tokens;
        }
        if let Some(max_retries) = update.max_retries {
            self.max_retries = max_retries;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.transport.request_timeout_secs = timeout;
        }
        if let Some(role) = update.default_role {
            self.default_role = role;
        }
        if let Some(language) = update.language {
            self.language = language;
        }
        if let Some(debug) = update.debug_mode {
            self.debug_mode = debug;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!("Invalid base_url: {}", self.base_url));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err("top_p must be between 0.0 and 1.0".to_string());
        }

        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be positive".to_string());
        }

        if self.max_retries == 0 || self.max_retries > 10 {
            return Err("max_retries must be between 1 and 10".to_string());
        }

        for (name, secs) in [
            ("backoff_base_secs", self.backoff_base_secs),
            ("default_rate_limit_delay_secs", self.default_rate_limit_delay_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }

        self.transport.validate().map_err(|e| e.to_string())?;

        // Validate language (basic check)
        if self.language.len() < 2 || self.language.len() > 5 {
            return Err(format!("Invalid language code: {}", self.language));
        }

        Ok(())
    }

    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff_base: secs_to_duration(self.backoff_base_secs),
            default_rate_limit_delay: secs_to_duration(self.default_rate_limit_delay_secs),
        }
    }

    /// Client configuration for the resolved API key.
    pub fn to_gemini_config(&self, api_key: impl Into<String>) -> GeminiConfig {
        GeminiConfig {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: api_key.into(),
            generation: self.generation_config(),
            retry: self.retry_policy(),
            transport: self.transport.clone(),
        }
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}
