//! Adaptiq: emotion-aware adaptive quiz difficulty
//!
//! Camera expression scores → EmotionSampler → rolling history →
//! AdaptiveController → difficulty level + question regeneration

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod types;

// =============================================================================
// EMOTION SAMPLING
// =============================================================================

/// Samples kept in the rolling history before the oldest is dropped
pub const HISTORY_CAPACITY: usize = 20;

/// Samples averaged for engagement/stress (most recent only)
pub const AVERAGE_WINDOW: usize = 6;

/// Top-two score margin below which the label becomes "confused"
pub const CONFUSION_MARGIN: f64 = 0.15;

/// Engagement reported for an empty history or an unknown label
pub const DEFAULT_ENGAGEMENT: f64 = 0.6;

/// Stress reported for an empty history or an unknown label
pub const DEFAULT_STRESS: f64 = 0.3;

// =============================================================================
// REACTIVE THRESHOLDS - evaluated against the latest sample only
// =============================================================================

/// Latest stress above this lowers difficulty immediately
pub const REACTIVE_STRESS_DOWN: f64 = 0.5;

/// Latest engagement below this lowers difficulty immediately
pub const REACTIVE_ENGAGEMENT_DOWN: f64 = 0.4;

/// Latest engagement above this (with low stress) raises difficulty
pub const REACTIVE_ENGAGEMENT_UP: f64 = 0.7;

/// Latest stress below this (with high engagement) raises difficulty
pub const REACTIVE_STRESS_UP: f64 = 0.4;

// =============================================================================
// STEADY-STATE THRESHOLDS - evaluated against rolling averages + accuracy
// =============================================================================

pub const STEADY_ENGAGEMENT_DOWN: f64 = 0.4;
pub const STEADY_STRESS_DOWN: f64 = 0.7;
pub const STEADY_ACCURACY_DOWN: f64 = 0.4;
pub const STEADY_ENGAGEMENT_UP: f64 = 0.7;
pub const STEADY_STRESS_UP: f64 = 0.4;
pub const STEADY_ACCURACY_UP: f64 = 0.75;

/// Accuracy assumed before any answer is recorded
pub const DEFAULT_ACCURACY: f64 = 0.5;

// =============================================================================
// DIFFICULTY RANGE
// =============================================================================

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Level at quiz start and after reset
pub const DEFAULT_LEVEL: u8 = 3;

// =============================================================================
// TIMERS (milliseconds)
// =============================================================================

/// Steady-state recompute delay, restarted on every sample
pub const DEBOUNCE_MS: u64 = 1500;

/// Lockout after a reactive change
pub const COOLDOWN_MS: u64 = 5000;

/// How long the up/down indicator stays visible
pub const DIRECTION_DISPLAY_MS: u64 = 2500;

/// Feedback time between an answer and the next question request
pub const ANSWER_FEEDBACK_MS: u64 = 700;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
