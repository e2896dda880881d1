//! Emotion labels and samples

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DEFAULT_ENGAGEMENT, DEFAULT_STRESS};

/// Raw classifier output: label → confidence-like score
///
/// Ordered map so that equal scores always resolve the same way.
pub type ExpressionScores = BTreeMap<String, f64>;

/// Discrete emotion tag stored on a sample
///
/// The classifier vocabulary is open; anything outside the known set is
/// kept verbatim as `Other` and maps to the neutral-leaning default.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmotionLabel {
    Happy,
    Neutral,
    Surprised,
    Sad,
    Stress,
    Fearful,
    Disgusted,
    Confused,
    Other(String),
}

impl EmotionLabel {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Happy => "happy",
            Self::Neutral => "neutral",
            Self::Surprised => "surprised",
            Self::Sad => "sad",
            Self::Stress => "stress",
            Self::Fearful => "fearful",
            Self::Disgusted => "disgusted",
            Self::Confused => "confused",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// (engagement, stress) for this label
    pub fn affect(&self) -> (f64, f64) {
        match self {
            Self::Happy => (0.9, 0.1),
            Self::Neutral => (0.6, 0.3),
            Self::Surprised => (0.7, 0.4),
            Self::Sad => (0.4, 0.6),
            Self::Stress => (0.3, 0.8),
            Self::Fearful => (0.2, 0.9),
            Self::Disgusted => (0.35, 0.75),
            Self::Confused => (0.5, 0.6),
            Self::Other(_) => (DEFAULT_ENGAGEMENT, DEFAULT_STRESS),
        }
    }

    /// Labels that always count as a negative reactive signal
    pub fn is_negative(&self) -> bool {
        matches!(self, Self::Stress | Self::Fearful | Self::Sad | Self::Disgusted)
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Happy => "😊",
            Self::Sad => "😢",
            Self::Stress => "😰",
            Self::Fearful => "😨",
            Self::Surprised => "😮",
            Self::Disgusted => "🤢",
            Self::Confused => "🧠",
            Self::Neutral | Self::Other(_) => "😐",
        }
    }
}

impl From<&str> for EmotionLabel {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "happy" => Self::Happy,
            "neutral" => Self::Neutral,
            "surprised" => Self::Surprised,
            "sad" => Self::Sad,
            "stress" => Self::Stress,
            "fearful" => Self::Fearful,
            "disgusted" => Self::Disgusted,
            "confused" => Self::Confused,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EmotionLabel {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<EmotionLabel> for String {
    fn from(label: EmotionLabel) -> Self {
        label.as_str().to_string()
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classification tick, immutable once recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSample {
    pub label: EmotionLabel,
    /// Top-label score from the classifier
    pub confidence: f64,
    /// Derived from `label`, not from `confidence`
    pub engagement: f64,
    pub stress: f64,
    pub timestamp: DateTime<Utc>,
    /// Arrival order within the sampler
    pub tick: u64,
}

impl EmotionSample {
    pub fn new(label: EmotionLabel, confidence: f64, tick: u64) -> Self {
        let (engagement, stress) = label.affect();
        Self {
            label,
            confidence,
            engagement,
            stress,
            timestamp: Utc::now(),
            tick,
        }
    }
}
