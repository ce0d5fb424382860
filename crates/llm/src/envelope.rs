//! Request and Response Envelopes
//!
//! Wire types for `generateContent` and the extraction helpers that turn a
//! response body into usable text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{GeminiError, GenerationConfig, LlmResult};

/// `generateContent` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    /// A single user-role content holding `prompt`.
    pub fn single_turn(prompt: impl Into<String>, generation_config: GenerationConfig) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.into(),
                }],
            }],
            generation_config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// Pull `candidates[0].content.parts[0].text` out of a 2xx body.
///
/// A body that is not JSON is an `InvalidResponse`; a missing or
/// wrong-typed segment is a `DecodingError` naming the segment.
pub fn extract_text(body: &str) -> LlmResult<String> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| GeminiError::invalid_response(format!("body is not JSON: {}", e)))?;

    let candidate = value
        .get("candidates")
        .and_then(Value::as_array)
        .ok_or_else(|| GeminiError::decoding("missing candidates array"))?
        .first()
        .ok_or_else(|| GeminiError::decoding("candidates array is empty"))?;

    let part = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .ok_or_else(|| GeminiError::decoding("missing content.parts"))?
        .first()
        .ok_or_else(|| GeminiError::decoding("content.parts is empty"))?;

    part.get("text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GeminiError::decoding("missing text in first part"))
}

/// Message from an `{error: {message}}` body, if present.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/// Strip markdown code fences from model output if present.
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Skip optional language tag
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim().to_string()
}

/// Locate the first balanced `{ ... }` object in free text.
///
/// Braces inside JSON strings are ignored. Returns `None` when no object
/// closes.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
