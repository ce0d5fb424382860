//! AI Roles
//!
//! Built-in conversation personas. A role's prompt is the system instruction
//! for every chat call made under it.

use serde::{Deserialize, Serialize};

/// A conversation persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRole {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
}

impl AiRole {
    fn builtin(id: &str, name: &str, description: &str, prompt: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            prompt: prompt.to_string(),
        }
    }
}

/// All built-in roles, in display order
pub fn builtin_roles() -> Vec<AiRole> {
    vec![
        AiRole::builtin(
            "therapist",
            "Counselor",
            "A professional counselor who listens closely and helps you work through your feelings.",
            "You are a professional counselor who is good at listening and understanding. Talk with the user in a gentle, professional tone.",
        ),
        AiRole::builtin(
            "life-coach",
            "Life Coach",
            "Guidance for personal growth: set goals and keep improving.",
            "You are a professional life coach who is good at motivating and guiding people. Talk with the user in a positive, encouraging tone.",
        ),
        AiRole::builtin(
            "friend",
            "Close Friend",
            "Listens and keeps you company like a friend, sharing life's ups and downs.",
            "You are a close friend who is good at listening and sharing. Talk with the user in a warm, natural tone.",
        ),
        AiRole::builtin(
            "motivator",
            "Motivator",
            "Helps you stay positive, overcome difficulties and reach your goals.",
            "You are a motivator who is good at lifting people's spirits. Talk with the user in an energetic, passionate tone.",
        ),
    ]
}

/// Look up a built-in role by id (case-insensitive)
pub fn find_role(id: &str) -> Option<AiRole> {
    let id = id.trim();
    builtin_roles()
        .into_iter()
        .find(|role| role.id.eq_ignore_ascii_case(id))
}
