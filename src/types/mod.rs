//! Core types for Adaptiq

mod emotion;
mod history;
mod difficulty;
mod quiz;
mod reason;
mod output;
mod report;

pub use emotion::{EmotionLabel, EmotionSample, ExpressionScores};
pub use history::EmotionHistory;
pub use difficulty::{ChangeDirection, DifficultyChange, DifficultyLevel, DifficultyState};
pub use quiz::{QuizPhase, QuizQuestion, QuizRunState};
pub use reason::ReasonCode;
pub use output::ControllerSnapshot;
pub use report::{CognitiveProfile, CognitiveScores, SessionReport};
