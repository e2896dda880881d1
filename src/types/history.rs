//! Rolling emotion history
//!
//! - Bounded: oldest sample dropped once capacity is exceeded
//! - Averages only ever look at the most recent window

use std::collections::VecDeque;

use crate::types::EmotionSample;
use crate::{AVERAGE_WINDOW, DEFAULT_ENGAGEMENT, DEFAULT_STRESS, HISTORY_CAPACITY};

/// Bounded, insertion-ordered sample history
#[derive(Debug, Clone)]
pub struct EmotionHistory {
    samples: VecDeque<EmotionSample>,
    capacity: usize,
    window: usize,
}

impl Default for EmotionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl EmotionHistory {
    /// Create history with default capacity (20) and window (6)
    pub fn new() -> Self {
        Self::with_limits(HISTORY_CAPACITY, AVERAGE_WINDOW)
    }

    /// Create history with custom limits (both at least 1)
    pub fn with_limits(capacity: usize, window: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            window: window.max(1),
        }
    }

    /// Append a sample, evicting the oldest when full
    pub fn push(&mut self, sample: EmotionSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&EmotionSample> {
        self.samples.back()
    }

    /// Last `window` samples, oldest first
    pub fn recent(&self) -> impl Iterator<Item = &EmotionSample> {
        let skip = self.samples.len().saturating_sub(self.window);
        self.samples.iter().skip(skip)
    }

    /// Mean engagement over the recent window
    pub fn average_engagement(&self) -> f64 {
        self.mean_of(|s| s.engagement).unwrap_or(DEFAULT_ENGAGEMENT)
    }

    /// Mean stress over the recent window
    pub fn average_stress(&self) -> f64 {
        self.mean_of(|s| s.stress).unwrap_or(DEFAULT_STRESS)
    }

    fn mean_of(&self, field: impl Fn(&EmotionSample) -> f64) -> Option<f64> {
        let (sum, count) = self
            .recent()
            .fold((0.0, 0usize), |(sum, count), s| (sum + field(s), count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// All samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &EmotionSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmotionLabel;

    fn sample(label: EmotionLabel, tick: u64) -> EmotionSample {
        EmotionSample::new(label, 0.9, tick)
    }

    #[test]
    fn test_empty_defaults() {
        let history = EmotionHistory::new();
        assert_eq!(history.average_engagement(), 0.6);
        assert_eq!(history.average_stress(), 0.3);
        assert!(history.latest().is_none());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = EmotionHistory::new();
        for tick in 0..25 {
            history.push(sample(EmotionLabel::Neutral, tick));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.iter().next().map(|s| s.tick), Some(5));
        assert_eq!(history.latest().map(|s| s.tick), Some(24));
    }

    #[test]
    fn test_average_uses_all_when_short() {
        let mut history = EmotionHistory::new();
        history.push(sample(EmotionLabel::Happy, 0));
        history.push(sample(EmotionLabel::Fearful, 1));
        assert!((history.average_engagement() - 0.55).abs() < 1e-9);
        assert!((history.average_stress() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_outlier_outside_window_is_ignored() {
        let mut history = EmotionHistory::new();
        history.push(sample(EmotionLabel::Fearful, 0));
        for tick in 1..=6 {
            history.push(sample(EmotionLabel::Happy, tick));
        }
        assert!((history.average_engagement() - 0.9).abs() < 1e-9);
        assert!((history.average_stress() - 0.1).abs() < 1e-9);
    }
}
