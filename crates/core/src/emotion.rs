//! Emotion Types
//!
//! Intensity maps over the fixed emotion vocabulary and the analysis result
//! produced by the decoder. The dominant label of a result is always present:
//! either supplied by the model or derived from the scores.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Label used when there is nothing to rank.
pub const NEUTRAL_LABEL: &str = "neutral";

/// The emotion vocabulary requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happiness,
    Sadness,
    Anger,
    Anxiety,
    Calmness,
}

impl Emotion {
    /// All emotions in prompt order.
    pub const ALL: [Emotion; 5] = [
        Emotion::Happiness,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Anxiety,
        Emotion::Calmness,
    ];

    /// Wire label used in prompts and responses.
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Happiness => "happiness",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Anxiety => "anxiety",
            Emotion::Calmness => "calmness",
        }
    }

    /// Traditional Chinese display name.
    pub fn localized_name(&self) -> &'static str {
        match self {
            Emotion::Happiness => "快樂",
            Emotion::Sadness => "悲傷",
            Emotion::Anger => "憤怒",
            Emotion::Anxiety => "焦慮",
            Emotion::Calmness => "平靜",
        }
    }

    /// Look up an emotion by wire label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.label().eq_ignore_ascii_case(label))
    }
}

impl FromStr for Emotion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| CoreError::not_found(format!("emotion '{}'", s.trim())))
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Mapping from emotion label to intensity in `[0.0, 1.0]`.
///
/// Keys are kept in lexicographic order. Values are clamped on insert;
/// non-finite values are stored as `0.0`. The map is not required to sum
/// to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionScoreMap(#[serde(deserialize_with = "deserialize_clamped")] BTreeMap<String, f64>);

impl EmotionScoreMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert a score, clamping it into range.
    pub fn insert(&mut self, label: impl Into<String>, intensity: f64) {
        self.0.insert(label.into(), clamp_intensity(intensity));
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    /// Score for a vocabulary emotion, `0.0` when absent.
    pub fn score(&self, emotion: Emotion) -> f64 {
        self.get(emotion.label()).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Label with the highest intensity.
    ///
    /// Ties resolve to the lexicographically smallest label. Returns `None`
    /// for an empty map.
    pub fn argmax(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (label, value) in self.iter() {
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((label, value)),
            }
        }
        best.map(|(label, _)| label)
    }

    /// Entries sorted by descending intensity, ties by label.
    pub fn sorted_desc(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<(&str, f64)> = self.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Rescale so the intensities sum to one. An all-zero map is returned
    /// unchanged.
    pub fn normalized(&self) -> Self {
        let total: f64 = self.0.values().sum();
        if total <= 0.0 {
            return self.clone();
        }
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v / total))
                .collect(),
        )
    }
}

impl FromIterator<(String, f64)> for EmotionScoreMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, value) in iter {
            map.insert(label, value);
        }
        map
    }
}

fn deserialize_clamped<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(label, value)| (label, clamp_intensity(value)))
        .collect())
}

fn clamp_intensity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Result of an emotion analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAnalysisResult")]
pub struct EmotionAnalysisResult {
    #[serde(rename = "emotions")]
    scores: EmotionScoreMap,
    #[serde(rename = "dominant_emotion")]
    dominant_label: String,
}

/// Stored form, re-validated through [`EmotionAnalysisResult::new`].
#[derive(Deserialize)]
struct RawAnalysisResult {
    #[serde(rename = "emotions", default)]
    scores: EmotionScoreMap,
    #[serde(rename = "dominant_emotion", default)]
    dominant_label: Option<String>,
}

impl From<RawAnalysisResult> for EmotionAnalysisResult {
    fn from(raw: RawAnalysisResult) -> Self {
        Self::new(raw.scores, raw.dominant_label)
    }
}

impl EmotionAnalysisResult {
    /// Build a result, deriving the dominant label when none (or a blank one)
    /// is supplied.
    pub fn new(scores: EmotionScoreMap, dominant_label: Option<String>) -> Self {
        let dominant_label = match dominant_label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => scores.argmax().unwrap_or(NEUTRAL_LABEL).to_string(),
        };
        Self {
            scores,
            dominant_label,
        }
    }

    pub fn scores(&self) -> &EmotionScoreMap {
        &self.scores
    }

    pub fn dominant_label(&self) -> &str {
        &self.dominant_label
    }

    /// Dominant label as a vocabulary emotion, if it is one.
    pub fn dominant_emotion(&self) -> Option<Emotion> {
        Emotion::from_label(&self.dominant_label)
    }
}
