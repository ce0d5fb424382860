//! Emotion Insights and Journal
//!
//! Presentation helpers over analysis results, and an in-memory journal of
//! emotion snapshots taken at the end of conversations.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mindmate_core::{Emotion, EmotionAnalysisResult, EmotionScoreMap};

use crate::utils::error::{AppError, AppResult};

/// Scores above this earn a themed tag.
const STRONG_EMOTION_THRESHOLD: f64 = 0.7;

/// How many emotions a snapshot highlights.
const TOP_EMOTIONS: usize = 3;

/// One row of an analysis breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionInsight {
    pub label: String,
    pub display_name: String,
    pub score: f64,
    pub percentage: String,
}

/// Display name for a label: localized for vocabulary emotions, the label
/// itself otherwise.
pub fn display_name(label: &str) -> String {
    Emotion::from_label(label)
        .map(|e| e.localized_name().to_string())
        .unwrap_or_else(|| label.to_string())
}

/// `0.756` -> `"75%"`. Truncates toward zero after absorbing float error,
/// so `0.29` renders as `"29%"`.
pub fn format_percentage(score: f64) -> String {
    let percent = (score.clamp(0.0, 1.0) * 100.0 + 1e-9).trunc().min(100.0);
    format!("{}%", percent as u32)
}

/// Breakdown sorted by descending score.
pub fn insights(result: &EmotionAnalysisResult) -> Vec<EmotionInsight> {
    result
        .scores()
        .sorted_desc()
        .into_iter()
        .map(|(label, score)| EmotionInsight {
            label: label.to_string(),
            display_name: display_name(label),
            score,
            percentage: format_percentage(score),
        })
        .collect()
}

/// The `n` strongest emotions, strongest first.
pub fn top_emotions(scores: &EmotionScoreMap, n: usize) -> Vec<(String, f64)> {
    scores
        .sorted_desc()
        .into_iter()
        .take(n)
        .map(|(label, score)| (label.to_string(), score))
        .collect()
}

fn strong_emotion_tag(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happiness => "開心時刻",
        Emotion::Sadness => "難過的日子",
        Emotion::Anger => "憤怒發洩",
        Emotion::Anxiety => "焦慮時光",
        Emotion::Calmness => "平靜時刻",
    }
}

/// Dominant label plus a themed tag for every strong vocabulary emotion.
pub fn suggested_tags(result: &EmotionAnalysisResult) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    if !result.scores().is_empty() {
        tags.insert(result.dominant_label().to_string());
    }
    for emotion in Emotion::ALL {
        if result.scores().score(emotion) > STRONG_EMOTION_THRESHOLD {
            tags.insert(strong_emotion_tag(emotion).to_string());
        }
    }
    tags
}

/// A saved analysis of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    pub id: Uuid,
    pub analysis: EmotionAnalysisResult,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_note: Option<String>,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl EmotionSnapshot {
    /// New snapshot tagged with [`suggested_tags`].
    pub fn new(analysis: EmotionAnalysisResult, summary: impl Into<String>) -> Self {
        let tags = suggested_tags(&analysis);
        Self {
            id: Uuid::new_v4(),
            analysis,
            summary: summary.into(),
            user_note: None,
            tags,
            created_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.user_note = Some(note.into()).filter(|n: &String| !n.trim().is_empty());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn top_emotions(&self) -> Vec<(String, f64)> {
        top_emotions(self.analysis.scores(), TOP_EMOTIONS)
    }
}

/// Window for trend queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRange {
    /// Since midnight (UTC)
    Day,
    /// Last seven days
    Week,
    /// Last calendar month
    Month,
}

impl TimeRange {
    /// Start of the window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::Day => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
            TimeRange::Week => now - Duration::days(7),
            TimeRange::Month => now.checked_sub_months(Months::new(1)).unwrap_or(now),
        }
    }
}

/// Scores of one snapshot on a timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionDataPoint {
    pub timestamp: DateTime<Utc>,
    pub scores: EmotionScoreMap,
}

/// In-memory collection of snapshots, oldest first.
#[derive(Debug, Default, Clone)]
pub struct EmotionJournal {
    snapshots: Vec<EmotionSnapshot>,
}

impl EmotionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, snapshot: EmotionSnapshot) {
        tracing::debug!(id = %snapshot.id, tags = snapshot.tags.len(), "snapshot added");
        self.snapshots.push(snapshot);
        self.snapshots.sort_by_key(|s| s.created_at);
    }

    pub fn delete(&mut self, id: Uuid) -> AppResult<EmotionSnapshot> {
        let index = self
            .snapshots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| AppError::not_found(format!("snapshot {}", id)))?;
        Ok(self.snapshots.remove(index))
    }

    pub fn snapshots(&self) -> &[EmotionSnapshot] {
        &self.snapshots
    }

    /// Scores of the most recent snapshot.
    pub fn latest_scores(&self) -> Option<&EmotionScoreMap> {
        self.snapshots.last().map(|s| s.analysis.scores())
    }

    /// Snapshots within `range` of `now`, oldest first.
    pub fn data_points(&self, range: TimeRange, now: DateTime<Utc>) -> Vec<EmotionDataPoint> {
        let start = range.start(now);
        self.snapshots
            .iter()
            .filter(|s| s.created_at >= start && s.created_at <= now)
            .map(|s| EmotionDataPoint {
                timestamp: s.created_at,
                scores: s.analysis.scores().clone(),
            })
            .collect()
    }
}
