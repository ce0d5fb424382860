//! Chat Session
//!
//! One conversation under one role. Each user message triggers two
//! independent calls that run concurrently:
//! - the chat reply over the whole conversation
//! - an emotion tag for that single message
//!
//! A failed reply becomes a visible error turn. A failed tag is logged and
//! the message simply stays untagged; it never blocks the reply.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use mindmate_core::{ChatTurn, EmotionAnalysisResult};
use mindmate_llm::{GeminiApi, GeminiError};

use crate::models::role::AiRole;
use crate::utils::error::{AppError, AppResult};

/// Result of one user message.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_turn: ChatTurn,
    /// AI reply, or the error notice shown in its place
    pub reply_turn: ChatTurn,
    pub reply_failed: bool,
    pub tag: Option<EmotionAnalysisResult>,
}

/// A running conversation.
pub struct ChatSession {
    api: Arc<dyn GeminiApi>,
    role: AiRole,
    turns: Vec<ChatTurn>,
    error_turns: HashSet<Uuid>,
    tags: HashMap<Uuid, EmotionAnalysisResult>,
}

impl ChatSession {
    pub fn new(api: Arc<dyn GeminiApi>, role: AiRole) -> Self {
        Self {
            api,
            role,
            turns: Vec::new(),
            error_turns: HashSet::new(),
            tags: HashMap::new(),
        }
    }

    pub fn role(&self) -> &AiRole {
        &self.role
    }

    /// Switch persona; the conversation so far is kept.
    pub fn set_role(&mut self, role: AiRole) {
        tracing::info!(role = %role.id, "switching role");
        self.role = role;
    }

    /// Every turn, error notices included.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_error_turn(&self, id: Uuid) -> bool {
        self.error_turns.contains(&id)
    }

    pub fn tag_for(&self, id: Uuid) -> Option<&EmotionAnalysisResult> {
        self.tags.get(&id)
    }

    /// Texts of the user's messages, oldest first.
    pub fn user_texts(&self) -> Vec<String> {
        self.turns
            .iter()
            .filter(|t| t.is_user())
            .map(|t| t.text().to_string())
            .collect()
    }

    /// Turns sent to the model: error notices are left out.
    fn conversation(&self) -> Vec<ChatTurn> {
        self.turns
            .iter()
            .filter(|t| !self.error_turns.contains(&t.id()))
            .cloned()
            .collect()
    }

    /// Send a user message.
    ///
    /// Only blank input is rejected; API failures are recorded as turns.
    pub async fn send(&mut self, text: &str) -> AppResult<TurnOutcome> {
        self.send_until_cancelled(text, &CancellationToken::new())
            .await
    }

    /// Like [`send`](Self::send); cancelling `cancel` ends both calls, and
    /// the reply is recorded as a cancelled error turn.
    pub async fn send_until_cancelled(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
    ) -> AppResult<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::validation("message is empty"));
        }

        let user_turn = ChatTurn::user(text);
        self.turns.push(user_turn.clone());
        let conversation = self.conversation();

        let tag_call = async {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GeminiError::Cancelled),
                result = self.api.analyze_single_message(text) => result,
            }
        };
        let (reply, tag) = tokio::join!(
            self.api
                .send_message_until_cancelled(&conversation, &self.role.prompt, cancel),
            tag_call,
        );

        let tag = match tag {
            Ok(result) => {
                tracing::debug!(dominant = result.dominant_label(), "message tagged");
                self.tags.insert(user_turn.id(), result.clone());
                Some(result)
            }
            Err(err) => {
                tracing::warn!(error = %err, "emotion tagging failed; message left untagged");
                None
            }
        };

        let (reply_turn, reply_failed) = match reply {
            Ok(reply) => (ChatTurn::ai(reply), false),
            Err(err) => {
                tracing::error!(error = %err, root_cause = %err.root_cause(), "chat reply failed");
                let notice = ChatTurn::ai(format!("Sorry, something went wrong: {}", err));
                self.error_turns.insert(notice.id());
                (notice, true)
            }
        };
        self.turns.push(reply_turn.clone());

        Ok(TurnOutcome {
            user_turn,
            reply_turn,
            reply_failed,
            tag,
        })
    }

    /// Emotion analysis over every user message so far.
    pub async fn analyze_conversation(&self) -> AppResult<EmotionAnalysisResult> {
        let texts = self.user_texts();
        Ok(self.api.analyze_conversation(&texts).await?)
    }

    /// Diary-style summary of the conversation so far.
    pub async fn summarize(&self) -> AppResult<String> {
        let conversation = self.conversation();
        Ok(self.api.summarize_conversation(&conversation).await?)
    }

    /// Drop all turns and tags.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.error_turns.clear();
        self.tags.clear();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("model", &self.api.model())
            .field("role", &self.role.id)
            .field("turns", &self.turns.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::find_role;
    use async_trait::async_trait;
    use mindmate_core::EmotionScoreMap;
    use mindmate_llm::LlmResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        fail_chat: bool,
        fail_tag: bool,
        chat_prompts: Mutex<Vec<(Vec<String>, String)>>,
    }

    fn calm() -> EmotionAnalysisResult {
        let scores: EmotionScoreMap = [("calmness".to_string(), 0.8)].into_iter().collect();
        EmotionAnalysisResult::new(scores, None)
    }

    #[async_trait]
    impl GeminiApi for FakeApi {
        fn model(&self) -> &str {
            "fake"
        }

        async fn send_message(&self, turns: &[ChatTurn], system_prompt: &str) -> LlmResult<String> {
            self.chat_prompts.lock().unwrap().push((
                turns.iter().map(|t| t.text().to_string()).collect(),
                system_prompt.to_string(),
            ));
            if self.fail_chat {
                Err(GeminiError::network("offline"))
            } else {
                Ok(format!("reply #{}", turns.len()))
            }
        }

        async fn analyze_emotions(&self, _texts: &[String]) -> LlmResult<EmotionAnalysisResult> {
            if self.fail_tag {
                Err(GeminiError::decoding("garbled"))
            } else {
                Ok(calm())
            }
        }

        async fn summarize_conversation(&self, turns: &[ChatTurn]) -> LlmResult<String> {
            Ok(format!("summary of {}", turns.len()))
        }
    }

    fn session(api: FakeApi) -> (ChatSession, Arc<FakeApi>) {
        let api = Arc::new(api);
        let role = find_role("friend").unwrap();
        (ChatSession::new(api.clone(), role), api)
    }

    #[tokio::test]
    async fn test_send_records_reply_and_tag() {
        let (mut session, api) = session(FakeApi::default());

        let outcome = session.send("  I feel relaxed today ").await.unwrap();

        assert_eq!(outcome.user_turn.text(), "I feel relaxed today");
        assert_eq!(outcome.reply_turn.text(), "reply #1");
        assert!(!outcome.reply_failed);
        assert_eq!(outcome.tag.as_ref().unwrap().dominant_label(), "calmness");
        assert_eq!(session.turns().len(), 2);
        assert!(session.tag_for(outcome.user_turn.id()).is_some());

        let prompts = api.chat_prompts.lock().unwrap();
        assert_eq!(prompts[0].1, session.role().prompt);
    }

    #[tokio::test]
    async fn test_chat_failure_becomes_error_turn() {
        let (mut session, api) = session(FakeApi {
            fail_chat: true,
            ..Default::default()
        });

        let outcome = session.send("hello").await.unwrap();
        assert!(outcome.reply_failed);
        assert!(outcome.reply_turn.text().contains("offline"));
        assert!(session.is_error_turn(outcome.reply_turn.id()));
        // Tagging still succeeded
        assert!(outcome.tag.is_some());

        // The error notice is not sent back to the model
        session.send("are you there?").await.unwrap();
        let prompts = api.chat_prompts.lock().unwrap();
        assert_eq!(prompts[1].0, vec!["hello", "are you there?"]);
    }

    #[tokio::test]
    async fn test_tag_failure_does_not_block_reply() {
        let (mut session, _api) = session(FakeApi {
            fail_tag: true,
            ..Default::default()
        });

        let outcome = session.send("hello").await.unwrap();
        assert!(!outcome.reply_failed);
        assert!(outcome.tag.is_none());
        assert!(session.tag_for(outcome.user_turn.id()).is_none());
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let (mut session, _api) = session(FakeApi::default());
        assert!(matches!(
            session.send("   ").await,
            Err(AppError::Validation(_))
        ));
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_user_texts_and_summary() {
        let (mut session, _api) = session(FakeApi::default());
        session.send("one").await.unwrap();
        session.send("two").await.unwrap();

        assert_eq!(session.user_texts(), vec!["one", "two"]);
        assert_eq!(session.summarize().await.unwrap(), "summary of 4");
        assert_eq!(
            session.analyze_conversation().await.unwrap().dominant_label(),
            "calmness"
        );

        session.clear();
        assert!(session.turns().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_send_records_error_turn() {
        let (mut session, _api) = session(FakeApi::default());
        let token = CancellationToken::new();
        token.cancel();

        let outcome = session.send_until_cancelled("hello", &token).await.unwrap();
        assert!(outcome.reply_failed);
        assert!(outcome.reply_turn.text().contains("cancelled"));
        assert!(outcome.tag.is_none());
    }
}
