//! Quiz questions and per-session run state

use serde::{Deserialize, Serialize};

/// A generated multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    /// Difficulty the generator claims for this question
    #[serde(default)]
    pub difficulty: Option<f64>,
}

impl QuizQuestion {
    pub fn is_correct(&self, option: &str) -> bool {
        self.answer == option
    }
}

/// Lifecycle of the current question slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizPhase {
    /// No question on screen
    Idle,
    /// Question shown, nothing selected yet
    AwaitingAnswer,
    /// Option selected, feedback showing
    Answered,
}

impl QuizPhase {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            QuizPhase::Idle => "\x1b[90m",           // Gray
            QuizPhase::AwaitingAnswer => "\x1b[36m", // Cyan
            QuizPhase::Answered => "\x1b[35m",       // Magenta
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            QuizPhase::Idle => "⏸",
            QuizPhase::AwaitingAnswer => "❓",
            QuizPhase::Answered => "✅",
        }
    }
}

impl std::fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QuizPhase::Idle => "IDLE",
            QuizPhase::AwaitingAnswer => "AWAITING_ANSWER",
            QuizPhase::Answered => "ANSWERED",
        };
        write!(f, "{}", name)
    }
}

/// Score counters and the question currently shown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizRunState {
    pub topic: String,
    pub score: u32,
    pub total_answered: u32,
    pub current_question: Option<QuizQuestion>,
    pub selected_option: Option<String>,
}

impl QuizRunState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Phase is derived, so it can never disagree with the slot contents
    pub fn phase(&self) -> QuizPhase {
        match (&self.current_question, &self.selected_option) {
            (None, _) => QuizPhase::Idle,
            (Some(_), None) => QuizPhase::AwaitingAnswer,
            (Some(_), Some(_)) => QuizPhase::Answered,
        }
    }

    /// score / answered, or None before the first answer
    pub fn accuracy(&self) -> Option<f64> {
        (self.total_answered > 0).then(|| self.score as f64 / self.total_answered as f64)
    }

    /// Load a fresh question into the slot
    pub fn show(&mut self, question: QuizQuestion) {
        self.current_question = Some(question);
        self.selected_option = None;
    }
}
