//! # Backoff
//!
//! Exponential retry delays for failed reconciliations.
//!
//! The sequence doubles from `base` until it reaches `max`:
//! 1s -> 2s -> 4s -> 8s -> ... -> 5m (with the default settings).
//! Each Seed keeps its own [`BackoffState`], so one failing Seed never slows down another.

use std::time::Duration;

/// Exponential backoff calculator
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max: Duration,
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempts: 0,
        }
    }

    /// Delay for the current attempt; advances to the next attempt
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Self::calculate_for_attempt(self.attempts, self.base, self.max);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    /// Delay for the given zero-based attempt without keeping state
    pub fn calculate_for_attempt(attempt: u32, base: Duration, max: Duration) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        base.saturating_mul(factor).min(max)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

/// Per-Seed backoff tracking
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: ExponentialBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            backoff: ExponentialBackoff::new(base, max),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}
