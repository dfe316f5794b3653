//! Retry budget and exponential backoff
//!
//! The retry loop in the fetcher is driven by [`Backoff`], a small state
//! machine: every transient failure is reported to it, and it either hands
//! back the delay before the next attempt or declares the budget exhausted.

use crate::config::FetchConfig;
use std::time::Duration;

/// How many attempts a URL gets and how long to wait between them
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: Duration::from_secs_f64(config.retry_delay),
            factor: config.backoff_factor,
            max_delay: Duration::from_secs_f64(config.max_backoff),
        }
    }

    /// Delay after the failed attempt number `attempt` (0-based)
    ///
    /// `base * factor^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }
}

/// Backoff state for one URL
#[derive(Debug)]
pub struct Backoff<'a> {
    policy: &'a RetryPolicy,
    failures: u32,
}

impl<'a> Backoff<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Attempts made so far
    pub fn attempts(&self) -> u32 {
        self.failures
    }

    /// Records a transient failure
    ///
    /// Returns the delay before the next attempt, or `None` when the budget
    /// is exhausted.
    pub fn record_failure(&mut self) -> Option<Duration> {
        let delay = self.policy.delay_for(self.failures);
        self.failures += 1;
        if self.failures >= self.policy.max_attempts {
            None
        } else {
            Some(delay)
        }
    }
}
