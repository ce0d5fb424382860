//! Services
//!
//! Application logic on top of the Gemini client.

pub mod chat;
pub mod emotion;

pub use chat::{ChatSession, TurnOutcome};
pub use emotion::{
    display_name, format_percentage, insights, suggested_tags, top_emotions, EmotionDataPoint,
    EmotionInsight, EmotionJournal, EmotionSnapshot, TimeRange,
};
