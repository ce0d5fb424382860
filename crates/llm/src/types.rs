//! Gemini Types
//!
//! Error taxonomy and configuration for the Gemini `generateContent` client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mindmate_core::TransportSettings;

use crate::retry::RetryPolicy;

/// Default API base for Gemini models.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Error types for Gemini operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeminiError {
    /// The endpoint URL could not be built
    #[error("Invalid URL: {message}")]
    InvalidUrl { message: String },

    /// The response was not HTTP or its body was not JSON
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Envelope or structured payload did not have the expected shape
    #[error("Decoding error: {message}")]
    DecodingError { message: String },

    /// The API key was rejected (HTTP 401)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// HTTP 429. `retry_after` is the server-requested delay, if any.
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Any other non-2xx status
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Connection, timeout or body-read failure
    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Every attempt failed with a retryable error
    #[error("Max retries exceeded after {attempts} attempts{}", describe_last(.last_error))]
    MaxRetriesExceeded {
        attempts: u32,
        last_error: Option<Box<GeminiError>>,
    },

    /// The caller cancelled the request
    #[error("Request cancelled")]
    Cancelled,

    /// No API key was configured
    #[error("Gemini API key is not configured")]
    MissingApiKey,
}

fn describe_last(last: &Option<Box<GeminiError>>) -> String {
    match last {
        Some(err) => format!(" (last error: {})", err),
        None => String::new(),
    }
}

impl GeminiError {
    pub fn decoding(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// A 429 is retryable only when the server said how long to wait.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeminiError::NetworkError { .. }
            | GeminiError::ServerError { .. }
            | GeminiError::DecodingError { .. }
            | GeminiError::InvalidResponse { .. } => true,
            GeminiError::RateLimited { retry_after, .. } => retry_after.is_some(),
            GeminiError::InvalidUrl { .. }
            | GeminiError::Unauthorized { .. }
            | GeminiError::MaxRetriesExceeded { .. }
            | GeminiError::Cancelled
            | GeminiError::MissingApiKey => false,
        }
    }

    /// Server-requested delay for a rate-limited response.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GeminiError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// The last concrete error behind a `MaxRetriesExceeded`, or `self`.
    pub fn root_cause(&self) -> &GeminiError {
        match self {
            GeminiError::MaxRetriesExceeded {
                last_error: Some(last),
                ..
            } => last.root_cause(),
            other => other,
        }
    }
}

/// Result type for Gemini operations
pub type LlmResult<T> = Result<T, GeminiError>;

/// Sampling parameters sent as `generationConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Configuration for a Gemini client
#[derive(Clone)]
pub struct GeminiConfig {
    /// Models collection URL, without trailing slash
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub generation: GenerationConfig,
    pub retry: RetryPolicy,
    pub transport: TransportSettings,
}

impl GeminiConfig {
    /// Defaults for everything except the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            generation: GenerationConfig::default(),
            retry: RetryPolicy::default(),
            transport: TransportSettings::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("generation", &self.generation)
            .field("retry", &self.retry)
            .field("transport", &self.transport)
            .finish()
    }
}
