//! MindMate Core
//!
//! Foundational domain types and error types for the MindMate workspace.
//! This crate has no dependency on HTTP, async runtimes or application code.
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `chat` - Immutable conversation turns (`ChatTurn`, `Sender`)
//! - `emotion` - Emotion vocabulary, score maps and analysis results
//! - `transport` - Timeout and proxy settings for outbound HTTP

pub mod chat;
pub mod emotion;
pub mod error;
pub mod transport;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Conversation ───────────────────────────────────────────────────────
pub use chat::{ChatTurn, Sender};

// ── Emotion ────────────────────────────────────────────────────────────
pub use emotion::{Emotion, EmotionAnalysisResult, EmotionScoreMap, NEUTRAL_LABEL};

// ── Transport ──────────────────────────────────────────────────────────
pub use transport::{ProxyConfig, ProxyProtocol, TransportSettings};
