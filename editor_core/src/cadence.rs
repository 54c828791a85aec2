//! Keystroke timing.
//!
//! Tracks the interval between keystrokes so the tokenization scheduler can
//! back off while the user is typing quickly.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Maximum number of samples to keep for rolling averages.
const MAX_SAMPLES: usize = 120;

/// Rolling statistics over the most recent durations.
#[derive(Debug, Clone)]
pub struct RollingStats {
    samples: VecDeque<Duration>,
    sum: Duration,
}

impl Default for RollingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingStats {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            sum: Duration::ZERO,
        }
    }

    /// Records a new sample, evicting the oldest at capacity.
    pub fn record(&mut self, duration: Duration) {
        if self.samples.len() >= MAX_SAMPLES {
            if let Some(old) = self.samples.pop_front() {
                self.sum = self.sum.saturating_sub(old);
            }
        }
        self.samples.push_back(duration);
        self.sum += duration;
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the average duration.
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            Duration::ZERO
        } else {
            self.sum / self.samples.len() as u32
        }
    }

    /// Returns the most recent duration.
    pub fn last(&self) -> Option<Duration> {
        self.samples.back().copied()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = Duration::ZERO;
    }
}

/// Inter-keystroke intervals for one buffer.
#[derive(Debug, Clone, Default)]
pub struct KeystrokeCadence {
    intervals: RollingStats,
    last_key: Option<Instant>,
}

impl KeystrokeCadence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a keystroke at `now`. Returns the interval since the previous
    /// one, if there was one.
    pub fn record(&mut self, now: Instant) -> Option<Duration> {
        let interval = self
            .last_key
            .map(|prev| now.saturating_duration_since(prev));
        if let Some(interval) = interval {
            self.intervals.record(interval);
        }
        self.last_key = Some(now);
        interval
    }

    /// The most recent inter-keystroke interval.
    pub fn last_interval(&self) -> Option<Duration> {
        self.intervals.last()
    }

    pub fn average_interval(&self) -> Duration {
        self.intervals.average()
    }

    pub fn reset(&mut self) {
        self.intervals.clear();
        self.last_key = None;
    }
}
