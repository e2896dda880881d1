//! Adaptive Controller: difficulty decisions for the active question slot
//!
//! Decision protocol, on every new sample while a question awaits an answer
//! and no cooldown is running:
//! - Reactive down: latest sample distressed → level - 1, replace question, 5s cooldown
//! - Reactive up: latest sample engaged and calm → level + 1, replace question, 5s cooldown
//! - Otherwise: (re)start the 1.5s debounce; on expiry recompute from rolling
//!   averages plus accuracy and replace the question if the level moved
//!
//! The controller is synchronous and owns no clock. Every call returns the
//! [`Effect`]s the caller must carry out: arm a timer, or fetch a question.
//! Timer tokens and question sequence numbers come back through
//! [`AdaptiveController::on_timer`] and [`AdaptiveController::on_question`];
//! anything superseded in the meantime is ignored.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::AdaptiveConfig;
use crate::core::sampler::{EmotionSampler, EmotionSource};
use crate::core::timer::{TimerKind, TimerSet, TimerToken};
use crate::error::{GenerationError, QuizError};
use crate::types::{
    ChangeDirection, ControllerSnapshot, DifficultyChange, DifficultyLevel, DifficultyState,
    EmotionLabel, EmotionSample, ExpressionScores, QuizPhase, QuizQuestion, QuizRunState, ReasonCode,
    SessionReport,
};

/// Work the controller asks its driver to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call `on_timer(token)` after `delay`
    Schedule { token: TimerToken, delay: Duration },
    /// Generate a question and call `on_question(seq, result)`
    RequestQuestion(QuestionRequest),
}

/// One question generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    /// Monotonic per controller; only the latest is ever accepted
    pub seq: u64,
    pub level: DifficultyLevel,
    pub topic: String,
}

/// Difficulty state machine for one learner
#[derive(Debug)]
pub struct AdaptiveController<S: EmotionSource = EmotionSampler> {
    config: AdaptiveConfig,
    source: S,
    difficulty: DifficultyState,
    run: QuizRunState,
    timers: TimerSet,
    next_seq: u64,
    in_flight: Option<u64>,
    error: Option<String>,
    last_reason: ReasonCode,
    changes: Vec<DifficultyChange>,
}

impl<S: EmotionSource> AdaptiveController<S> {
    /// Create a controller reading emotions from `source`
    pub fn new(config: AdaptiveConfig, source: S) -> Self {
        let level = config.default_level;
        Self {
            config,
            source,
            difficulty: DifficultyState::new(level),
            run: QuizRunState::default(),
            timers: TimerSet::new(),
            next_seq: 0,
            in_flight: None,
            error: None,
            last_reason: ReasonCode::D208_NOT_AWAITING,
            changes: Vec::new(),
        }
    }

    // =========================================================================
    // Quiz lifecycle
    // =========================================================================

    /// Start (or restart) a quiz on `topic` at the default level
    pub fn start(&mut self, topic: &str) -> Result<Vec<Effect>, QuizError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(QuizError::EmptyTopic);
        }

        self.reset();
        self.run.topic = topic.to_string();
        info!(topic, level = %self.difficulty.level, "quiz started");

        Ok(vec![self.request_question(self.difficulty.level)])
    }

    /// Back to Idle: counters zeroed, default level, every timer and request dropped
    pub fn reset(&mut self) {
        self.timers.cancel_all();
        self.in_flight = None;
        self.run = QuizRunState::default();
        self.difficulty = DifficultyState::new(self.config.default_level);
        self.error = None;
        self.changes.clear();
        self.last_reason = ReasonCode::D208_NOT_AWAITING;
        debug!("quiz reset");
    }

    /// Record the learner's choice; the next question follows after the feedback delay
    ///
    /// Returns whether the choice was correct.
    pub fn submit_answer(&mut self, option: &str) -> Result<(bool, Vec<Effect>), QuizError> {
        let correct = match (self.run.phase(), &self.run.current_question) {
            (QuizPhase::AwaitingAnswer, Some(question)) => question.is_correct(option),
            (QuizPhase::Answered, _) => return Err(QuizError::AlreadyAnswered),
            _ => return Err(QuizError::NoActiveQuestion),
        };

        self.run.selected_option = Some(option.to_string());
        self.run.total_answered += 1;
        if correct {
            self.run.score += 1;
        }

        // Nothing tied to the answered question may fire afterwards
        self.timers.cancel(TimerKind::Debounce);
        self.timers.cancel(TimerKind::Cooldown);
        self.in_flight = None;

        info!(
            correct,
            score = self.run.score,
            answered = self.run.total_answered,
            "answer recorded"
        );

        let delay = self.config.answer_feedback();
        Ok((correct, vec![self.schedule(TimerKind::AnswerFeedback, delay)]))
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Evaluate the decision protocol against the latest sample
    pub fn on_sample(&mut self) -> Vec<Effect> {
        if self.run.phase() != QuizPhase::AwaitingAnswer {
            self.last_reason = ReasonCode::D208_NOT_AWAITING;
            return Vec::new();
        }
        if self.timers.is_armed(TimerKind::Cooldown) {
            self.last_reason = ReasonCode::D207_COOLDOWN_ACTIVE;
            return Vec::new();
        }
        let Some(latest) = self.source.latest().cloned() else {
            return Vec::new();
        };

        if self.is_reactive_down(&latest) {
            let target = self.difficulty.level.lower();
            return self.react(target, ChangeDirection::Down, ReasonCode::D201_REACTIVE_DOWN);
        }

        if self.is_reactive_up(&latest) {
            let target = self.difficulty.level.raise();
            return self.react(target, ChangeDirection::Up, ReasonCode::D202_REACTIVE_UP);
        }

        self.last_reason = ReasonCode::D206_STEADY_SCHEDULED;
        let delay = self.config.debounce();
        vec![self.schedule(TimerKind::Debounce, delay)]
    }

    /// A previously scheduled timer elapsed
    pub fn on_timer(&mut self, token: TimerToken) -> Vec<Effect> {
        if !self.timers.fire(token) {
            debug!(kind = ?token.kind, generation = token.generation, "superseded timer ignored");
            return Vec::new();
        }

        match token.kind {
            TimerKind::Debounce => self.steady_state(),
            TimerKind::Cooldown => {
                debug!("cooldown finished");
                Vec::new()
            }
            TimerKind::DirectionClear => {
                self.difficulty.changed_direction = ChangeDirection::None;
                Vec::new()
            }
            TimerKind::AnswerFeedback => vec![self.request_question(self.difficulty.level)],
        }
    }

    /// A question request finished
    pub fn on_question(
        &mut self,
        seq: u64,
        result: Result<QuizQuestion, GenerationError>,
    ) -> Vec<Effect> {
        if self.in_flight != Some(seq) {
            debug!(seq, latest = ?self.in_flight, "stale question response discarded");
            self.last_reason = ReasonCode::G302_STALE_RESPONSE;
            return Vec::new();
        }
        self.in_flight = None;

        match result {
            Ok(question) => {
                info!(seq, level = %self.difficulty.level, "question accepted");
                self.run.show(question);
                self.error = None;
                self.last_reason = ReasonCode::G301_QUESTION_ACCEPTED;
            }
            Err(err) => {
                warn!(seq, error = %err, "question generation failed");
                // Prior question stays on screen and can be answered again
                self.run.selected_option = None;
                self.error = Some(err.to_string());
                self.last_reason = ReasonCode::G303_GENERATION_FAILED;
            }
        }
        Vec::new()
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    fn is_reactive_down(&self, sample: &EmotionSample) -> bool {
        // All four signals are kept even where the label table makes them overlap
        sample.stress > self.config.reactive_stress_down
            || sample.engagement < self.config.reactive_engagement_down
            || sample.label == EmotionLabel::Confused
            || sample.label.is_negative()
    }

    fn is_reactive_up(&self, sample: &EmotionSample) -> bool {
        sample.engagement > self.config.reactive_engagement_up
            && sample.stress < self.config.reactive_stress_up
    }

    fn react(
        &mut self,
        target: DifficultyLevel,
        direction: ChangeDirection,
        reason: ReasonCode,
    ) -> Vec<Effect> {
        self.timers.cancel(TimerKind::Debounce);

        let mut effects = self.apply_change(target, direction, reason);
        effects.push(self.request_question(target));

        let cooldown = self.config.cooldown();
        effects.push(self.schedule(TimerKind::Cooldown, cooldown));
        effects
    }

    fn steady_state(&mut self) -> Vec<Effect> {
        if self.run.phase() != QuizPhase::AwaitingAnswer
            || self.timers.is_armed(TimerKind::Cooldown)
            || self.source.sample_count() == 0
        {
            return Vec::new();
        }

        let engagement = self.source.average_engagement();
        let stress = self.source.average_stress();
        let accuracy = self.run.accuracy().unwrap_or(self.config.default_accuracy);
        let current = self.difficulty.level;

        let (target, direction, reason) = if engagement < self.config.steady_engagement_down
            || stress > self.config.steady_stress_down
            || accuracy < self.config.steady_accuracy_down
        {
            (current.lower(), ChangeDirection::Down, ReasonCode::D203_STEADY_DOWN)
        } else if engagement > self.config.steady_engagement_up
            && stress < self.config.steady_stress_up
            && accuracy > self.config.steady_accuracy_up
        {
            (current.raise(), ChangeDirection::Up, ReasonCode::D204_STEADY_UP)
        } else {
            (current, ChangeDirection::None, ReasonCode::D205_STEADY_HOLD)
        };

        debug!(engagement, stress, accuracy, reason = reason.code(), "steady-state recompute");

        if target == current {
            self.last_reason = ReasonCode::D205_STEADY_HOLD;
            return Vec::new();
        }

        let mut effects = self.apply_change(target, direction, reason);
        effects.push(self.request_question(target));
        effects
    }

    fn apply_change(
        &mut self,
        target: DifficultyLevel,
        direction: ChangeDirection,
        reason: ReasonCode,
    ) -> Vec<Effect> {
        let from = self.difficulty.level;
        info!(from = %from, to = %target, reason = reason.code(), "difficulty changed");

        self.changes.push(DifficultyChange {
            from,
            to: target,
            direction,
            reason,
            at: Utc::now(),
        });
        self.difficulty.level = target;
        self.difficulty.changed_direction = direction;
        self.last_reason = reason;

        let delay = self.config.direction_display();
        vec![self.schedule(TimerKind::DirectionClear, delay)]
    }

    fn request_question(&mut self, level: DifficultyLevel) -> Effect {
        self.next_seq += 1;
        self.in_flight = Some(self.next_seq);
        self.error = None;
        Effect::RequestQuestion(QuestionRequest {
            seq: self.next_seq,
            level,
            topic: self.run.topic.clone(),
        })
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> Effect {
        Effect::Schedule {
            token: self.timers.arm(kind),
            delay,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn level(&self) -> DifficultyLevel {
        self.difficulty.level
    }

    /// Current difficulty state, with the live cooldown flag
    pub fn difficulty(&self) -> DifficultyState {
        DifficultyState {
            cooldown_active: self.timers.is_armed(TimerKind::Cooldown),
            ..self.difficulty.clone()
        }
    }

    pub fn run(&self) -> &QuizRunState {
        &self.run
    }

    pub fn phase(&self) -> QuizPhase {
        self.run.phase()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending_timers(&self) -> bool {
        [
            TimerKind::Debounce,
            TimerKind::Cooldown,
            TimerKind::DirectionClear,
            TimerKind::AnswerFeedback,
        ]
        .into_iter()
        .any(|kind| self.timers.is_armed(kind))
    }

    pub fn changes(&self) -> &[DifficultyChange] {
        &self.changes
    }

    pub fn last_reason(&self) -> ReasonCode {
        self.last_reason
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let difficulty = self.difficulty();
        ControllerSnapshot {
            timestamp: Utc::now(),
            topic: self.run.topic.clone(),
            phase: self.run.phase(),
            level: difficulty.level,
            changed_direction: difficulty.changed_direction,
            cooldown_active: difficulty.cooldown_active,
            score: self.run.score,
            total_answered: self.run.total_answered,
            question: self.run.current_question.clone(),
            selected_option: self.run.selected_option.clone(),
            loading: self.is_loading(),
            error: self.error.clone(),
            emotion: self.source.latest().map(|s| s.label.clone()),
            average_engagement: self.source.average_engagement(),
            average_stress: self.source.average_stress(),
            reason: self.last_reason,
        }
    }
}

impl AdaptiveController<EmotionSampler> {
    /// Controller with its own sampler, both tuned by `config`
    pub fn with_sampler(config: AdaptiveConfig) -> Self {
        let sampler = EmotionSampler::with_config(&config);
        Self::new(config, sampler)
    }

    /// One camera tick: `None` means no face was found
    ///
    /// Unusable ticks record nothing and change nothing.
    pub fn observe(&mut self, scores: Option<&ExpressionScores>) -> Vec<Effect> {
        let Some(scores) = scores else {
            debug!("no face detected, tick skipped");
            self.last_reason = ReasonCode::S102_NO_FACE;
            return Vec::new();
        };
        match self.source.classify_tick(scores) {
            Some(_) => self.on_sample(),
            None => {
                self.last_reason = ReasonCode::S103_MALFORMED_SCORES;
                Vec::new()
            }
        }
    }

    /// Summarise the session so far
    pub fn report(&self) -> SessionReport {
        let mut emotion_counts: BTreeMap<String, u32> = BTreeMap::new();
        for sample in self.source.history().iter() {
            *emotion_counts.entry(sample.label.to_string()).or_insert(0) += 1;
        }

        let now = Utc::now();
        SessionReport {
            id: format!("report_{}_{}", now.format("%Y%m%d_%H%M%S"), uuid::Uuid::new_v4().simple()),
            created_at: now,
            topic: self.run.topic.clone(),
            score: self.run.score,
            total_answered: self.run.total_answered,
            accuracy: self.run.accuracy(),
            final_level: self.difficulty.level,
            level_changes: self.changes.clone(),
            average_engagement: self.source.average_engagement(),
            average_stress: self.source.average_stress(),
            emotion_counts,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
