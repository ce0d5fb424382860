//! MindMate - Application Library
//!
//! Companion-chat backend built on the Gemini client in `mindmate-llm`.
//! It includes:
//! - Configuration file and API key resolution
//! - The built-in role catalogue
//! - Chat sessions with concurrent per-message emotion tagging
//! - Emotion insights, snapshots and the emotion journal

pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use models::role::{builtin_roles, find_role, AiRole};
pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{ChatSession, EmotionJournal, EmotionSnapshot, TurnOutcome};
pub use storage::{resolve_api_key, ConfigService, KeySource};
pub use utils::error::{AppError, AppResult};
