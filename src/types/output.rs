//! Point-in-time view of a quiz session for display and the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    ChangeDirection, DifficultyLevel, EmotionLabel, QuizPhase, QuizQuestion, ReasonCode,
};

/// Everything a UI needs to render one frame of the quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub phase: QuizPhase,
    pub level: DifficultyLevel,
    pub changed_direction: ChangeDirection,
    pub cooldown_active: bool,
    pub score: u32,
    pub total_answered: u32,
    pub question: Option<QuizQuestion>,
    pub selected_option: Option<String>,
    /// A question request is in flight
    pub loading: bool,
    /// Single user-visible error slot
    pub error: Option<String>,
    pub emotion: Option<EmotionLabel>,
    pub average_engagement: f64,
    pub average_stress: f64,
    /// Reason for the most recent decision
    pub reason: ReasonCode,
}

impl ControllerSnapshot {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.phase.color_code();
        let reset = QuizPhase::color_reset();
        let emotion = self
            .emotion
            .as_ref()
            .map(|e| format!("{} {}", e.emoji(), e))
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{}{} level={}{} ({}) | {} | score={}/{} | eng={:.0}% stress={:.0}% | {}{}",
            color,
            self.phase.emoji(),
            self.level,
            self.changed_direction.arrow(),
            self.level.label(),
            emotion,
            self.score,
            self.total_answered,
            self.average_engagement * 100.0,
            self.average_stress * 100.0,
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | level={} | direction={:?} | cooldown={} | score={}/{} | emotion={} | engagement={:.3} | stress={:.3} | reason={}",
            self.phase,
            self.level,
            self.changed_direction,
            self.cooldown_active,
            self.score,
            self.total_answered,
            self.emotion.as_ref().map(|e| e.as_str()).unwrap_or("-"),
            self.average_engagement,
            self.average_stress,
            self.reason.code()
        )
    }
}
