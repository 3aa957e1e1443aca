//! One logical outbound request: throttle, send, classify, retry.
//!
//! | Outcome | Behavior |
//! |---------|----------|
//! | 200 | Body returned (parsed for [`HttpFetcher::fetch_json`]) |
//! | 429 | Sleep `rate_limit_delay * (attempt + 1)`, retry |
//! | 403 / 404 | Fail immediately |
//! | Other status | Sleep `delay * (attempt + 1)`, retry |
//! | Timeout / connect failure | Same linear backoff, retry |
//! | Other transport failure | Fail immediately |
//! | Malformed JSON | Fail immediately |

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest};
use crate::retry::RetryConfig;
use crate::throttling::RateLimiter;
use crate::{Clock, SourceId};

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

/// Why a fetch produced no body. Every variant means "try the next source".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("access forbidden (403)")]
    Forbidden,
    #[error("resource not found (404)")]
    NotFound,
    #[error("rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("upstream returned status {status}")]
    Status { status: u16 },
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("malformed response body: {message}")]
    Malformed { message: String },
}

/// Rate-limited HTTP fetcher with retry and backoff.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Arc<dyn HttpClient>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(client: Arc<dyn HttpClient>, limiter: Arc<RateLimiter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            limiter,
            clock,
            retry: RetryConfig::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Fetches and parses a JSON body.
    pub async fn fetch_json(&self, source: SourceId, request: HttpRequest) -> Result<Value, FetchError> {
        let body = self.fetch_text(source, request).await?;
        serde_json::from_str(&body).map_err(|error| {
            warn!(source = source.as_str(), %error, "response body is not valid JSON");
            FetchError::Malformed {
                message: error.to_string(),
            }
        })
    }

    /// Fetches a raw text body (HTML pages).
    pub async fn fetch_text(&self, source: SourceId, request: HttpRequest) -> Result<String, FetchError> {
        self.limiter.acquire(source).await;

        let request = request.with_timeout_ms(self.timeout_ms);
        let mut attempt = 0;

        loop {
            debug!(source = source.as_str(), url = %request.url, attempt, "sending request");

            let wait = match self.client.execute(request.clone()).await {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) if response.status == 429 => {
                    if !self.retry.has_next(attempt) {
                        warn!(source = source.as_str(), attempt, "rate limited, giving up");
                        return Err(FetchError::RateLimited {
                            attempts: attempt + 1,
                        });
                    }
                    let wait = self.retry.rate_limit_delay_for_attempt(attempt);
                    warn!(
                        source = source.as_str(),
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        "rate limited, backing off"
                    );
                    wait
                }
                Ok(response) if self.retry.is_fail_fast(response.status) => {
                    warn!(source = source.as_str(), status = response.status, url = %request.url, "request rejected");
                    return Err(match response.status {
                        403 => FetchError::Forbidden,
                        404 => FetchError::NotFound,
                        status => FetchError::Status { status },
                    });
                }
                Ok(response) => {
                    if !self.retry.has_next(attempt) {
                        warn!(source = source.as_str(), status = response.status, "unexpected status, giving up");
                        return Err(FetchError::Status {
                            status: response.status,
                        });
                    }
                    let wait = self.retry.delay_for_attempt(attempt);
                    warn!(
                        source = source.as_str(),
                        status = response.status,
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        "unexpected status, retrying"
                    );
                    wait
                }
                Err(error) => {
                    let retryable = match error.kind() {
                        HttpErrorKind::Timeout => self.retry.retry_on_timeout,
                        HttpErrorKind::Connect => self.retry.retry_on_connect,
                        HttpErrorKind::Other => false,
                    };
                    if !retryable || !self.retry.has_next(attempt) {
                        warn!(source = source.as_str(), %error, "transport failure, giving up");
                        return Err(FetchError::Transport {
                            message: error.message().to_owned(),
                        });
                    }
                    let wait = self.retry.delay_for_attempt(attempt);
                    warn!(
                        source = source.as_str(),
                        %error,
                        attempt,
                        wait_secs = wait.as_secs_f64(),
                        "transport failure, retrying"
                    );
                    wait
                }
            };

            self.clock.sleep(wait).await;
            attempt += 1;
        }
    }
}
