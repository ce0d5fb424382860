//! Test doubles for the transport and the retry clock.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::envelope::GenerateContentRequest;
use crate::retry::Sleeper;
use crate::transport::{RawResponse, Transport};
use crate::types::{GeminiError, LlmResult};

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Replays queued outcomes, one per request, and records what was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<LlmResult<RawResponse>>>,
    requests: Mutex<Vec<(Url, GenerateContentRequest)>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = LlmResult<RawResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(Url, GenerateContentRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, req)| req.contents.first())
            .and_then(|c| c.parts.first())
            .map(|p| p.text.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &Url, body: &GenerateContentRequest) -> LlmResult<RawResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((url.clone(), body.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GeminiError::network("script exhausted")))
    }
}

/// A 200 body wrapping `text` in the Gemini envelope.
pub fn envelope(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}
