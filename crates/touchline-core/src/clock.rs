//! Time source used by throttling, retries and cache freshness checks.
//!
//! [`SystemClock`] is the production implementation. [`ManualClock`] never
//! waits: `sleep` advances its virtual time instantly and records the
//! requested duration, which keeps rate-limit and TTL tests deterministic.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use time::OffsetDateTime;

use crate::MatchDate;

/// Wall-clock reads and sleeps.
pub trait Clock: Send + Sync + Debug {
    /// Current instant, UTC.
    fn now(&self) -> OffsetDateTime;

    /// Suspends the caller for `duration`.
    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Current instant as fractional unix seconds.
    fn unix_seconds(&self) -> f64 {
        self.now().unix_timestamp_nanos() as f64 / 1_000_000_000.0
    }

    fn today(&self) -> MatchDate {
        MatchDate::from_date(self.now().date())
    }
}

/// OS clock with tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[derive(Debug)]
struct ManualState {
    now: OffsetDateTime,
    sleeps: Vec<Duration>,
}

/// Virtual clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Starts at `unix_seconds`; out-of-range values fall back to the epoch.
    pub fn at_unix(unix_seconds: i64) -> Self {
        Self::new(
            OffsetDateTime::from_unix_timestamp(unix_seconds)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
        )
    }

    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.now += duration;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sleeps
            .clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.now += duration;
            state.sleeps.push(duration);
        }
        Box::pin(tokio::task::yield_now())
    }
}
