//! MindMate LLM
//!
//! Gemini `generateContent` client used by MindMate:
//! - Shared retry controller (exponential backoff, `Retry-After`, cancellation)
//! - Response extraction with code-fence stripping and JSON-in-prose recovery
//! - Structured emotion decoding
//! - Chat, emotion-analysis and summary façades over one pipeline
//!
//! Also includes the HTTP client factory and the pluggable transport.

pub mod decoder;
pub mod envelope;
pub mod gemini;
pub mod http_client;
pub mod prompts;
pub mod provider;
pub mod retry;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use decoder::decode_emotion_analysis;
pub use envelope::{extract_json_object, extract_text, strip_code_fences, GenerateContentRequest};
pub use gemini::GeminiClient;
pub use http_client::build_http_client;
pub use prompts::{DefaultPrompts, PromptBuilder};
pub use provider::GeminiApi;
pub use retry::{RetryController, RetryPolicy, Sleeper, TokioSleeper};
pub use transport::{RawResponse, ReqwestTransport, Transport};
pub use types::*;

// Re-export the cancellation token callers pass to the `_until_cancelled` calls
pub use tokio_util::sync::CancellationToken;
