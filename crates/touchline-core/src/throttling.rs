//! Per-source request throttling.
//!
//! Each source gets its own window guarded by an async mutex, so callers of
//! one source queue behind each other while other sources proceed freely.
//! A call is admitted once the minimum interval since the previous request
//! has passed and the current calendar minute still has budget.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::{Clock, SourceId, SystemClock};

const NANOS_PER_MINUTE: i128 = 60_000_000_000;

/// Throttling limits applied to every source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum spacing between two requests to the same source, in seconds.
    pub min_interval_secs: f64,
    pub max_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 1.0,
            max_requests_per_minute: 50,
        }
    }
}

impl RateLimitConfig {
    pub fn min_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_interval_secs.max(0.0)).unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Default)]
struct SourceWindow {
    last_request: Option<OffsetDateTime>,
    /// Request counts keyed by unix minute.
    minute_buckets: BTreeMap<i64, u32>,
}

/// Async rate limiter keyed by [`SourceId`].
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<SourceId, Arc<tokio::sync::Mutex<SourceWindow>>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default(), Arc::new(SystemClock))
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Waits until a request to `source` is allowed, then records it.
    pub async fn acquire(&self, source: SourceId) {
        let window = self.window_for(source);
        let mut window = window.lock().await;
        let cap = self.config.max_requests_per_minute.max(1);

        loop {
            let now = self.clock.now();
            let minute = unix_minute(now);
            window.minute_buckets.retain(|bucket, _| *bucket >= minute - 1);

            let used = window.minute_buckets.get(&minute).copied().unwrap_or(0);
            if used < cap {
                break;
            }

            let wait = until_next_minute(now);
            debug!(
                source = source.as_str(),
                used,
                wait_ms = wait.as_millis() as u64,
                "minute budget exhausted, waiting for next minute"
            );
            self.clock.sleep(wait).await;
        }

        let min_interval = self.config.min_interval();
        if let Some(last) = window.last_request {
            let elapsed = elapsed_since(last, self.clock.now());
            if elapsed < min_interval {
                let wait = min_interval - elapsed;
                debug!(
                    source = source.as_str(),
                    wait_ms = wait.as_millis() as u64,
                    "spacing request"
                );
                self.clock.sleep(wait).await;
            }
        }

        let now = self.clock.now();
        window.last_request = Some(now);
        *window.minute_buckets.entry(unix_minute(now)).or_insert(0) += 1;
    }

    /// Requests recorded for `source` in the current calendar minute.
    pub async fn requests_this_minute(&self, source: SourceId) -> u32 {
        let window = self.window_for(source);
        let window = window.lock().await;
        window
            .minute_buckets
            .get(&unix_minute(self.clock.now()))
            .copied()
            .unwrap_or(0)
    }

    fn window_for(&self, source: SourceId) -> Arc<tokio::sync::Mutex<SourceWindow>> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(windows.entry(source).or_default())
    }
}

fn unix_minute(at: OffsetDateTime) -> i64 {
    at.unix_timestamp().div_euclid(60)
}

fn until_next_minute(now: OffsetDateTime) -> Duration {
    let into_minute = now.unix_timestamp_nanos().rem_euclid(NANOS_PER_MINUTE);
    Duration::from_nanos(u64::try_from(NANOS_PER_MINUTE - into_minute).unwrap_or(0))
}

fn elapsed_since(earlier: OffsetDateTime, now: OffsetDateTime) -> Duration {
    if now <= earlier {
        return Duration::ZERO;
    }
    (now - earlier).unsigned_abs()
}
