//! Adaptive debounce for re-tokenization.
//!
//! Small files re-tokenize almost immediately; large files and fast typing
//! stretch the interval so parsing does not compete with keystrokes. The
//! scheduler is trailing-edge: every new request replaces the pending
//! deadline, and the host polls with explicit instants.

use serde::Deserialize;
use std::time::{Duration, Instant};

/// Debounce settings. Durations are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    /// Files with more lines than this get a longer interval.
    pub large_file_threshold: usize,
    /// Keystrokes closer together than this count as fast typing.
    pub fast_typing_latency_ms: u64,
    pub fast_typing_bonus_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 50,
            max_interval_ms: 300,
            large_file_threshold: 1000,
            fast_typing_latency_ms: 100,
            fast_typing_bonus_ms: 100,
        }
    }
}

/// Per-buffer trailing-edge debouncer.
#[derive(Debug, Clone, Default)]
pub struct TokenizationScheduler {
    config: SchedulerConfig,
    deadline: Option<Instant>,
    /// Requests folded into the pending one.
    coalesced: usize,
}

impl TokenizationScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            deadline: None,
            coalesced: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Debounce interval for a file of `line_count` lines, given the most
    /// recent inter-keystroke latency.
    pub fn debounce_interval(&self, line_count: usize, latency: Option<Duration>) -> Duration {
        let cfg = &self.config;
        let min = cfg.min_interval_ms as f64;
        let max = (cfg.max_interval_ms as f64).max(min);
        let threshold = cfg.large_file_threshold;

        let mut interval = if line_count <= threshold || threshold == 0 {
            min
        } else {
            let ratio = ((line_count - threshold) as f64 / threshold as f64).min(1.0);
            min + (max - min) * ratio
        };

        if latency.is_some_and(|l| l < Duration::from_millis(cfg.fast_typing_latency_ms)) {
            interval += cfg.fast_typing_bonus_ms as f64;
        }

        Duration::from_micros((interval.min(max) * 1000.0).round() as u64)
    }

    /// Schedules a re-tokenization, replacing any pending one. Returns the
    /// new deadline.
    pub fn schedule(&mut self, now: Instant, line_count: usize, latency: Option<Duration>) -> Instant {
        let deadline = now + self.debounce_interval(line_count, latency);
        if self.deadline.replace(deadline).is_some() {
            self.coalesced += 1;
        }
        log::trace!("tokenization scheduled for {} lines", line_count);
        deadline
    }

    /// Returns true exactly once when the pending deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                if self.coalesced > 0 {
                    log::debug!("tokenization fired after coalescing {} requests", self.coalesced);
                }
                self.deadline = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    /// Drops the pending request.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.coalesced = 0;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of requests replaced since the last fire.
    pub fn coalesced(&self) -> usize {
        self.coalesced
    }
}
