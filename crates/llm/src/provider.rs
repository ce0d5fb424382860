//! Gemini API Trait
//!
//! The interface the chat session and analysis helpers depend on. Implemented
//! by [`GeminiClient`]; tests substitute their own implementations.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mindmate_core::{ChatTurn, EmotionAnalysisResult};

use crate::gemini::GeminiClient;
use crate::types::LlmResult;

/// Chat and emotion-analysis operations.
///
/// Calls are independent of each other and may run concurrently.
#[async_trait]
pub trait GeminiApi: Send + Sync {
    /// Returns the model being used.
    fn model(&self) -> &str;

    /// Chat reply for the prior turns under a role instruction.
    async fn send_message(&self, prior_turns: &[ChatTurn], system_prompt: &str)
        -> LlmResult<String>;

    /// Emotion scores for the given texts.
    async fn analyze_emotions(&self, texts: &[String]) -> LlmResult<EmotionAnalysisResult>;

    /// Diary-style summary of a conversation.
    async fn summarize_conversation(&self, turns: &[ChatTurn]) -> LlmResult<String>;

    /// Like [`send_message`](GeminiApi::send_message), but ends with
    /// `Cancelled` once `cancel` fires.
    ///
    /// The default races the plain call against the token; dropping the call
    /// future drops any in-flight request.
    async fn send_message_until_cancelled(
        &self,
        prior_turns: &[ChatTurn],
        system_prompt: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(crate::GeminiError::Cancelled),
            result = self.send_message(prior_turns, system_prompt) => result,
        }
    }

    /// Tag for one user message.
    async fn analyze_single_message(&self, text: &str) -> LlmResult<EmotionAnalysisResult> {
        self.analyze_emotions(&[text.to_string()]).await
    }

    /// Analysis over every user message of a conversation.
    async fn analyze_conversation(&self, texts: &[String]) -> LlmResult<EmotionAnalysisResult> {
        self.analyze_emotions(texts).await
    }
}

#[async_trait]
impl GeminiApi for GeminiClient {
    fn model(&self) -> &str {
        GeminiClient::model(self)
    }

    async fn send_message(
        &self,
        prior_turns: &[ChatTurn],
        system_prompt: &str,
    ) -> LlmResult<String> {
        GeminiClient::send_message(self, prior_turns, system_prompt).await
    }

    async fn analyze_emotions(&self, texts: &[String]) -> LlmResult<EmotionAnalysisResult> {
        GeminiClient::analyze_emotions(self, texts).await
    }

    async fn summarize_conversation(&self, turns: &[ChatTurn]) -> LlmResult<String> {
        GeminiClient::summarize_conversation(self, turns).await
    }

    async fn send_message_until_cancelled(
        &self,
        prior_turns: &[ChatTurn],
        system_prompt: &str,
        cancel: &CancellationToken,
    ) -> LlmResult<String> {
        GeminiClient::send_message_until_cancelled(self, prior_turns, system_prompt, cancel).await
    }
}
