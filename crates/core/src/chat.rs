//! Chat Turn Types
//!
//! A conversation is an ordered log of immutable turns. Turns are created
//! once and never edited; annotations such as emotion tags live beside the
//! log, keyed by turn id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Ai => write!(f, "ai"),
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    id: Uuid,
    text: String,
    sender: Sender,
    timestamp: DateTime<Utc>,
}

impl ChatTurn {
    /// Create a turn stamped with a fresh id and the current time.
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    /// Create an AI turn
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Sender::Ai, text)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}
