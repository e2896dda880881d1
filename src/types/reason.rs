//! Reason codes for sensing, difficulty decisions and generation outcomes

use serde::{Deserialize, Serialize};

/// Reason codes attached to every controller decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // S1xx: Sensing
    // =========================================================================
    /// Classifier saw no face, tick skipped
    S102_NO_FACE,
    /// Scores empty or non-finite, tick skipped
    S103_MALFORMED_SCORES,

    // =========================================================================
    // D2xx: Difficulty decisions
    // =========================================================================
    /// Latest sample shows distress, lowered immediately
    D201_REACTIVE_DOWN,
    /// Latest sample shows high engagement with low stress, raised immediately
    D202_REACTIVE_UP,
    /// Averages or accuracy too low, lowered after debounce
    D203_STEADY_DOWN,
    /// Averages and accuracy high, raised after debounce
    D204_STEADY_UP,
    /// Steady-state recompute found nothing to change
    D205_STEADY_HOLD,
    /// Steady-state recompute scheduled (debounce restarted)
    D206_STEADY_SCHEDULED,
    /// Evaluation skipped: cooldown active
    D207_COOLDOWN_ACTIVE,
    /// Evaluation skipped: no question awaiting an answer
    D208_NOT_AWAITING,

    // =========================================================================
    // G3xx: Question generation
    // =========================================================================
    /// New question accepted into the slot
    G301_QUESTION_ACCEPTED,
    /// Response superseded by a newer request, discarded
    G302_STALE_RESPONSE,
    /// Generator failed, prior question kept
    G303_GENERATION_FAILED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::S102_NO_FACE => "S102_NO_FACE",
            Self::S103_MALFORMED_SCORES => "S103_MALFORMED_SCORES",
            Self::D201_REACTIVE_DOWN => "D201_REACTIVE_DOWN",
            Self::D202_REACTIVE_UP => "D202_REACTIVE_UP",
            Self::D203_STEADY_DOWN => "D203_STEADY_DOWN",
            Self::D204_STEADY_UP => "D204_STEADY_UP",
            Self::D205_STEADY_HOLD => "D205_STEADY_HOLD",
            Self::D206_STEADY_SCHEDULED => "D206_STEADY_SCHEDULED",
            Self::D207_COOLDOWN_ACTIVE => "D207_COOLDOWN_ACTIVE",
            Self::D208_NOT_AWAITING => "D208_NOT_AWAITING",
            Self::G301_QUESTION_ACCEPTED => "G301_QUESTION_ACCEPTED",
            Self::G302_STALE_RESPONSE => "G302_STALE_RESPONSE",
            Self::G303_GENERATION_FAILED => "G303_GENERATION_FAILED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::S102_NO_FACE => "No face detected",
            Self::S103_MALFORMED_SCORES => "Expression scores unusable",
            Self::D201_REACTIVE_DOWN => "Difficulty lowered to help",
            Self::D202_REACTIVE_UP => "Difficulty increased",
            Self::D203_STEADY_DOWN => "Difficulty eased after sustained struggle",
            Self::D204_STEADY_UP => "Difficulty raised after sustained success",
            Self::D205_STEADY_HOLD => "Difficulty unchanged",
            Self::D206_STEADY_SCHEDULED => "Recompute scheduled",
            Self::D207_COOLDOWN_ACTIVE => "Cooling down",
            Self::D208_NOT_AWAITING => "No question awaiting an answer",
            Self::G301_QUESTION_ACCEPTED => "New question shown",
            Self::G302_STALE_RESPONSE => "Outdated question discarded",
            Self::G303_GENERATION_FAILED => "Question generation failed",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
