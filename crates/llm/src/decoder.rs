//! Structured-Result Decoder
//!
//! Turns model output into an [`EmotionAnalysisResult`]. Output is cleaned of
//! code fences first; if it is still not a JSON object, the first object
//! embedded in the surrounding prose is used.

use std::collections::BTreeMap;

use serde::Deserialize;

use mindmate_core::{EmotionAnalysisResult, EmotionScoreMap};

use crate::envelope::{extract_json_object, strip_code_fences};
use crate::types::{GeminiError, LlmResult};

#[derive(Debug, Deserialize)]
struct EmotionPayload {
    emotions: BTreeMap<String, f64>,
    #[serde(default)]
    dominant_emotion: Option<String>,
}

/// Decode the emotion payload from extracted model text.
pub fn decode_emotion_analysis(text: &str) -> LlmResult<EmotionAnalysisResult> {
    let cleaned = strip_code_fences(text);

    let payload = match serde_json::from_str::<EmotionPayload>(&cleaned) {
        Ok(payload) => payload,
        Err(direct_err) => {
            let embedded = extract_json_object(&cleaned).ok_or_else(|| {
                GeminiError::decoding(format!("emotion payload is not JSON: {}", direct_err))
            })?;
            tracing::debug!("decoding emotion payload embedded in prose");
            serde_json::from_str::<EmotionPayload>(embedded).map_err(|e| {
                GeminiError::decoding(format!("invalid emotion payload: {}", e))
            })?
        }
    };

    let scores: EmotionScoreMap = payload.emotions.into_iter().collect();
    Ok(EmotionAnalysisResult::new(scores, payload.dominant_emotion))
}
