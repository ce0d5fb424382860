//! Gemini Client
//!
//! One parameterised client for every call shape. Each façade builds a prompt,
//! then runs the shared pipeline:
//!
//! ```text
//! prompt -> POST generateContent -> classify status -> extract text -> decode
//!                 ^                        |
//!                 +---- retry controller --+
//! ```
//!
//! The client holds no per-call state, so one instance can serve concurrent
//! calls behind an `Arc`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use mindmate_core::{ChatTurn, EmotionAnalysisResult, EmotionScoreMap};

use crate::decoder::decode_emotion_analysis;
use crate::envelope::{extract_text, GenerateContentRequest};
use crate::prompts::{DefaultPrompts, PromptBuilder};
use crate::retry::{classify_response, RetryController, Sleeper, TokioSleeper};
use crate::transport::{redact_url, ReqwestTransport, Transport};
use crate::types::{GeminiConfig, GeminiError, LlmResult};

/// Gemini `generateContent` client.
pub struct GeminiClient {
    config: GeminiConfig,
    endpoint: Url,
    transport: Arc<dyn Transport>,
    retry: RetryController,
    prompts: Arc<dyn PromptBuilder>,
}

impl GeminiClient {
    /// Client over reqwest with the real clock.
    pub fn new(config: GeminiConfig) -> LlmResult<Self> {
        let transport = ReqwestTransport::new(&config.transport)?;
        Self::with_transport(config, Arc::new(transport), Arc::new(TokioSleeper))
    }

    /// Client over a custom transport and sleeper.
    pub fn with_transport(
        config: GeminiConfig,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
    ) -> LlmResult<Self> {
        let endpoint = build_endpoint(&config)?;
        let retry = RetryController::with_sleeper(config.retry.clone(), sleeper);
        Ok(Self {
            config,
            endpoint,
            transport,
            retry,
            prompts: Arc::new(DefaultPrompts),
        })
    }

    /// Replace the prompt builder.
    pub fn with_prompts(mut self, prompts: Arc<dyn PromptBuilder>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Chat completion over the prior turns. Returns the model text as is.
    pub async fn send_message(
        &self,
        prior_turns: &[ChatTurn],
        system_prompt: &str,
    ) -> LlmResult<String> {
        self.send_message_until_cancelled(prior_turns, system_prompt, &CancellationToken::new())
            .await
    }

    pub async fn send_message_until_cancelled(
        &self,
        prior_turns: &[ChatTurn],
        system_prompt: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<String> {
        let prompt = self.prompts.chat_prompt(system_prompt, prior_turns);
        self.execute("send_message", prompt, cancel, |text| Ok(text.to_string()))
            .await
    }

    /// Emotion analysis over `texts`.
    ///
    /// Input with no non-blank text yields a neutral result without calling
    /// the API.
    pub async fn analyze_emotions(&self, texts: &[String]) -> LlmResult<EmotionAnalysisResult> {
        self.analyze_emotions_until_cancelled(texts, &CancellationToken::new())
            .await
    }

    pub async fn analyze_emotions_until_cancelled(
        &self,
        texts: &[String],
        cancel: &CancellationToken,
    ) -> LlmResult<EmotionAnalysisResult> {
        if texts.iter().all(|t| t.trim().is_empty()) {
            tracing::debug!("no text to analyse; returning neutral result");
            return Ok(EmotionAnalysisResult::new(EmotionScoreMap::new(), None));
        }
        let prompt = self.prompts.emotion_prompt(texts);
        self.execute("analyze_emotions", prompt, cancel, decode_emotion_analysis)
            .await
    }

    /// Per-message tag for a single user message.
    pub async fn analyze_single_message(&self, text: &str) -> LlmResult<EmotionAnalysisResult> {
        self.analyze_emotions(&[text.to_string()]).await
    }

    /// Whole-conversation analysis over the user's messages.
    pub async fn analyze_conversation(
        &self,
        texts: &[String],
    ) -> LlmResult<EmotionAnalysisResult> {
        self.analyze_emotions(texts).await
    }

    /// Short first-person diary entry for a conversation.
    pub async fn summarize_conversation(&self, turns: &[ChatTurn]) -> LlmResult<String> {
        self.summarize_conversation_until_cancelled(turns, &CancellationToken::new())
            .await
    }

    pub async fn summarize_conversation_until_cancelled(
        &self,
        turns: &[ChatTurn],
        cancel: &CancellationToken,
    ) -> LlmResult<String> {
        if turns.is_empty() {
            return Ok(String::new());
        }
        let prompt = self.prompts.summary_prompt(turns);
        self.execute("summarize_conversation", prompt, cancel, |text| {
            Ok(text.trim().to_string())
        })
        .await
    }

    /// Run one logical request through the retry controller.
    async fn execute<T>(
        &self,
        operation: &str,
        prompt: String,
        cancel: &CancellationToken,
        decode: fn(&str) -> LlmResult<T>,
    ) -> LlmResult<T> {
        let request = GenerateContentRequest::single_turn(prompt, self.config.generation.clone());
        let request = &request;

        tracing::debug!(
            operation,
            model = %self.config.model,
            url = %redact_url(&self.endpoint),
            "gemini request"
        );

        self.retry
            .run(operation, cancel, move |attempt| async move {
                let raw = self.transport.post_json(&self.endpoint, request).await?;
                tracing::debug!(operation, attempt, status = raw.status, "attempt finished");
                classify_response(&raw, self.retry.policy())?;
                let text = extract_text(&raw.body)?;
                decode(&text)
            })
            .await
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("endpoint", &redact_url(&self.endpoint))
            .field("retry", self.retry.policy())
            .finish()
    }
}

/// `{base}/{model}:generateContent?key={api_key}`
fn build_endpoint(config: &GeminiConfig) -> LlmResult<Url> {
    if config.api_key.trim().is_empty() {
        return Err(GeminiError::MissingApiKey);
    }
    let model = config.model.trim();
    if model.is_empty() || model.contains('/') {
        return Err(GeminiError::InvalidUrl {
            message: format!("invalid model name '{}'", config.model),
        });
    }

    let raw = format!(
        "{}/{}:generateContent",
        config.base_url.trim_end_matches('/'),
        model
    );
    let mut url = Url::parse(&raw).map_err(|e| GeminiError::InvalidUrl {
        message: format!("{}: {}", raw, e),
    })?;
    if url.cannot_be_a_base() {
        return Err(GeminiError::InvalidUrl {
            message: format!("{} is not an absolute URL", raw),
        });
    }
    url.query_pairs_mut()
        .append_pair("key", config.api_key.trim());
    Ok(url)
}
