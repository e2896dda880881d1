//! Emotion Sampler: raw expression scores → vetted EmotionSample
//!
//! Per tick:
//! 1. Rank labels by score, highest first
//! 2. "angry" is recorded as "stress"
//! 3. A top-two margin under 0.15 becomes "confused" (never overrides stress)
//! 4. Engagement/stress come from the fixed label table
//! 5. The sample is appended to the bounded history

use tracing::debug;

use crate::config::AdaptiveConfig;
use crate::types::{EmotionHistory, EmotionLabel, EmotionSample, ExpressionScores, ReasonCode};
use crate::CONFUSION_MARGIN;

/// Classifier label standing in for stress
const STRESS_PROXY_LABEL: &str = "angry";

/// Read side of the sampler, handed to the controller
pub trait EmotionSource {
    /// Most recent sample, if any
    fn latest(&self) -> Option<&EmotionSample>;
    /// Mean engagement over the recent window (0.6 when empty)
    fn average_engagement(&self) -> f64;
    /// Mean stress over the recent window (0.3 when empty)
    fn average_stress(&self) -> f64;
    fn sample_count(&self) -> usize;
}

/// Sole writer of the emotion history
#[derive(Debug, Clone)]
pub struct EmotionSampler {
    history: EmotionHistory,
    confusion_margin: f64,
    next_tick: u64,
}

impl Default for EmotionSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionSampler {
    pub fn new() -> Self {
        Self {
            history: EmotionHistory::new(),
            confusion_margin: CONFUSION_MARGIN,
            next_tick: 0,
        }
    }

    pub fn with_config(config: &AdaptiveConfig) -> Self {
        Self {
            history: EmotionHistory::with_limits(config.history_capacity, config.average_window),
            confusion_margin: config.confusion_margin,
            next_tick: 0,
        }
    }

    /// Pick the final label and its confidence without touching history
    pub fn classify(&self, scores: &ExpressionScores) -> Result<(EmotionLabel, f64), ReasonCode> {
        if scores.is_empty() || scores.values().any(|v| !v.is_finite()) {
            return Err(ReasonCode::S103_MALFORMED_SCORES);
        }

        let mut ranked: Vec<(&str, f64)> = scores.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let (top_raw, top_score) = ranked[0];
        let second_score = ranked.get(1).map(|(_, s)| *s).unwrap_or(0.0);

        let mut label = if top_raw.eq_ignore_ascii_case(STRESS_PROXY_LABEL) {
            EmotionLabel::Stress
        } else {
            EmotionLabel::from(top_raw)
        };

        if label != EmotionLabel::Stress && top_score - second_score < self.confusion_margin {
            label = EmotionLabel::Confused;
        }

        Ok((label, top_score))
    }

    /// Classify one tick and record it; `None` when the scores are unusable
    pub fn classify_tick(&mut self, scores: &ExpressionScores) -> Option<EmotionSample> {
        match self.classify(scores) {
            Ok((label, confidence)) => {
                let sample = EmotionSample::new(label, confidence, self.next_tick);
                self.next_tick += 1;
                debug!(
                    label = %sample.label,
                    confidence = sample.confidence,
                    engagement = sample.engagement,
                    stress = sample.stress,
                    "emotion sample recorded"
                );
                self.history.push(sample.clone());
                Some(sample)
            }
            Err(reason) => {
                debug!(reason = reason.code(), "emotion tick skipped");
                None
            }
        }
    }

    pub fn history(&self) -> &EmotionHistory {
        &self.history
    }
}

impl EmotionSource for EmotionSampler {
    fn latest(&self) -> Option<&EmotionSample> {
        self.history.latest()
    }

    fn average_engagement(&self) -> f64 {
        self.history.average_engagement()
    }

    fn average_stress(&self) -> f64 {
        self.history.average_stress()
    }

    fn sample_count(&self) -> usize {
        self.history.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> ExpressionScores {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_clear_winner_keeps_label() {
        let mut sampler = EmotionSampler::new();
        let sample = sampler
            .classify_tick(&scores(&[("happy", 0.8), ("neutral", 0.1), ("sad", 0.05)]))
            .unwrap();
        assert_eq!(sample.label, EmotionLabel::Happy);
        assert_eq!(sample.confidence, 0.8);
        assert_eq!((sample.engagement, sample.stress), (0.9, 0.1));
    }

    #[test]
    fn test_angry_becomes_stress() {
        let mut sampler = EmotionSampler::new();
        let sample = sampler
            .classify_tick(&scores(&[("angry", 0.9), ("neutral", 0.05)]))
            .unwrap();
        assert_eq!(sample.label, EmotionLabel::Stress);
        assert_eq!((sample.engagement, sample.stress), (0.3, 0.8));
    }

    #[test]
    fn test_angry_with_small_margin_stays_stress() {
        let sampler = EmotionSampler::new();
        let (label, _) = sampler
            .classify(&scores(&[("angry", 0.45), ("sad", 0.44)]))
            .unwrap();
        assert_eq!(label, EmotionLabel::Stress);
    }

    #[test]
    fn test_small_margin_becomes_confused() {
        let sampler = EmotionSampler::new();
        let (label, confidence) = sampler
            .classify(&scores(&[("happy", 0.5), ("surprised", 0.4), ("neutral", 0.1)]))
            .unwrap();
        assert_eq!(label, EmotionLabel::Confused);
        assert_eq!(confidence, 0.5);
    }

    #[test]
    fn test_single_label_compares_against_zero() {
        let sampler = EmotionSampler::new();
        let (label, _) = sampler.classify(&scores(&[("sad", 0.1)])).unwrap();
        assert_eq!(label, EmotionLabel::Confused);

        let (label, _) = sampler.classify(&scores(&[("sad", 0.9)])).unwrap();
        assert_eq!(label, EmotionLabel::Sad);
    }

    #[test]
    fn test_unknown_label_defaults_affect() {
        let mut sampler = EmotionSampler::new();
        let sample = sampler
            .classify_tick(&scores(&[("bored", 0.9), ("happy", 0.05)]))
            .unwrap();
        assert_eq!(sample.label, EmotionLabel::Other("bored".to_string()));
        assert_eq!((sample.engagement, sample.stress), (0.6, 0.3));
    }

    #[test]
    fn test_malformed_scores_do_not_update() {
        let mut sampler = EmotionSampler::new();
        assert!(sampler.classify_tick(&ExpressionScores::new()).is_none());
        assert!(sampler
            .classify_tick(&scores(&[("happy", f64::NAN), ("sad", 0.1)]))
            .is_none());
        assert_eq!(sampler.sample_count(), 0);
    }

    #[test]
    fn test_ticks_are_monotonic() {
        let mut sampler = EmotionSampler::new();
        let a = sampler.classify_tick(&scores(&[("happy", 0.9)])).unwrap();
        let b = sampler.classify_tick(&scores(&[("happy", 0.9)])).unwrap();
        assert!(b.tick > a.tick);
        assert_eq!(sampler.latest().map(|s| s.tick), Some(b.tick));
    }
}
