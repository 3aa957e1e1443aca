//! Retry policy for the HTTP fetcher.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Linear backoff: grows by one `step` per attempt, `step * (attempt + 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    /// Delay before the first retry.
    pub step: Duration,
}

impl Backoff {
    pub const fn linear(step: Duration) -> Self {
        Self { step }
    }

    /// Calculate the delay after a given attempt (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt.saturating_add(1))
    }
}

/// Configuration for the fetcher's retry loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Backoff after server errors, timeouts and connection failures.
    pub backoff: Backoff,
    /// Backoff after a 429 response.
    pub rate_limit_backoff: Backoff,
    /// Statuses that end the request immediately.
    pub fail_fast_status: Vec<u16>,
    /// Whether to retry on request timeouts.
    pub retry_on_timeout: bool,
    /// Whether to retry on connection errors.
    pub retry_on_connect: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

impl RetryConfig {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.attempts.max(1),
            backoff: Backoff::linear(secs(settings.delay_secs)),
            rate_limit_backoff: Backoff::linear(secs(settings.rate_limit_delay_secs)),
            fail_fast_status: vec![403, 404],
            retry_on_timeout: true,
            retry_on_connect: true,
        }
    }

    /// Single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn is_fail_fast(&self, status: u16) -> bool {
        self.fail_fast_status.contains(&status)
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    pub fn rate_limit_delay_for_attempt(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff.delay(attempt)
    }

    /// Whether another attempt follows `attempt` (0-based).
    pub const fn has_next(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }
}

/// Serializable retry knobs as they appear in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub attempts: u32,
    /// Linear backoff step after server errors and transport failures.
    pub delay_secs: f64,
    /// Linear backoff step after a 429 response.
    pub rate_limit_delay_secs: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 2.0,
            rate_limit_delay_secs: 60.0,
        }
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}
