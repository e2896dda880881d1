//! Session reports and learner profiles

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{DifficultyChange, DifficultyLevel};

/// Summary of one quiz session, written to the report directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Unique identifier, also the file stem
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub topic: String,
    pub score: u32,
    pub total_answered: u32,
    pub accuracy: Option<f64>,
    pub final_level: DifficultyLevel,
    /// Every applied difficulty change, oldest first
    pub level_changes: Vec<DifficultyChange>,
    pub average_engagement: f64,
    pub average_stress: f64,
    /// Samples seen per label over the retained history
    pub emotion_counts: BTreeMap<String, u32>,
}

/// Scores from the cognitive screening games, 0-100 each
///
/// Games the learner skipped are absent and contribute no hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveScores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attention: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_memory: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_spatial: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auditory_processing: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_time: Option<f64>,
}

/// Learner profile used to tailor generated questions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitiveProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub cognitive_scores: CognitiveScores,
}
