//! Prompt Builders
//!
//! Every façade of [`GeminiClient`](crate::GeminiClient) runs through the same
//! request pipeline; they differ only in the prompt text built here and in the
//! terminal decode step.

use mindmate_core::{ChatTurn, Emotion, Sender};

/// Example payload embedded in the emotion prompt.
pub const EMOTION_EXAMPLE_JSON: &str = r#"{"emotions":{"happiness":0.7,"sadness":0.2,"anger":0.1,"anxiety":0.3,"calmness":0.5},"dominant_emotion":"happiness"}"#;

/// System line used for conversation summaries.
pub const DIARY_WRITER_PROMPT: &str =
    "You are a diary-writing assistant who turns conversations into warm, personal journal entries.";

/// Builds the prompt text for each façade.
pub trait PromptBuilder: Send + Sync {
    /// Role instruction followed by the prior turn texts, one per line.
    fn chat_prompt(&self, system_prompt: &str, prior_turns: &[ChatTurn]) -> String;

    /// Emotion-analysis instruction followed by the texts to analyse.
    fn emotion_prompt(&self, texts: &[String]) -> String;

    /// Diary-summary instruction over a labelled transcript.
    fn summary_prompt(&self, turns: &[ChatTurn]) -> String;
}

/// Built-in prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPrompts;

impl PromptBuilder for DefaultPrompts {
    fn chat_prompt(&self, system_prompt: &str, prior_turns: &[ChatTurn]) -> String {
        let history = prior_turns
            .iter()
            .map(|turn| turn.text())
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}\n{}", system_prompt, history)
    }

    fn emotion_prompt(&self, texts: &[String]) -> String {
        let vocabulary = Emotion::ALL
            .iter()
            .map(|e| format!("- {} ({})", e.label(), e.localized_name()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Analyse the emotions in the user messages below and return the intensity of each of these emotions:\n\
             {vocabulary}\n\n\
             Each intensity is a number from 0.0 to 1.0.\n\n\
             Return ONLY the JSON object, with no explanation, labels or markdown. For example:\n\
             {EMOTION_EXAMPLE_JSON}\n\n\
             User messages:\n\
             {}",
            texts.join("\n")
        )
    }

    fn summary_prompt(&self, turns: &[ChatTurn]) -> String {
        let transcript = turns
            .iter()
            .map(|turn| {
                let speaker = match turn.sender() {
                    Sender::User => "Me",
                    Sender::Ai => "AI",
                };
                format!("{}: {}", speaker, turn.text())
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{DIARY_WRITER_PROMPT}\n\
             Summarise the conversation below as a short diary entry.\n\
             Requirements:\n\
             1. Write in the first person\n\
             2. Keep the emotions expressed in the conversation\n\
             3. No more than 100 characters\n\
             4. Use a gentle tone\n\n\
             Conversation:\n\
             {transcript}"
        )
    }
}
