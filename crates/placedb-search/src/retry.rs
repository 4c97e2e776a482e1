use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use placedb_core::config::RetrySettings;
use placedb_core::traits::PlaceSearch;
use placedb_core::{CategoryQuery, Error, Place, Region, Result};

/// Bounded linear backoff for rate-limited upstream calls: the wait after failed
/// attempt `n` is `n × backoff_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self { Self { max_attempts: 5, backoff_step: Duration::from_secs(10) } }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self { max_attempts: s.max_attempts.max(1), backoff_step: Duration::from_millis(s.backoff_ms) }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration { self.backoff_step.saturating_mul(attempt) }

    /// Runs `call` until it succeeds, fails with anything but a rate limit, or the
    /// attempt budget is spent. Only the calling task waits.
    pub async fn run<T, F, Fut>(&self, op: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_rate_limited() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(op, attempt, "upstream rate limited; retrying after {:?}", delay);
                    sleep(delay).await;
                }
                Err(err) if err.is_rate_limited() => {
                    warn!(op, attempt, "upstream still rate limited; giving up");
                    return Err(Error::UpstreamRateLimited { attempts: attempt });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Wraps any [`PlaceSearch`] with [`RetryPolicy`].
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self { Self { inner, policy } }
    pub fn policy(&self) -> &RetryPolicy { &self.policy }
}

#[async_trait]
impl<S: PlaceSearch> PlaceSearch for Retrying<S> {
    async fn count(&self, region: &Region, query: &CategoryQuery) -> Result<u32> {
        self.policy.run("count", || self.inner.count(region, query)).await
    }

    async fn fetch(&self, region: &Region, query: &CategoryQuery) -> Result<Vec<Place>> {
        self.policy.run("fetch", || self.inner.fetch(region, query)).await
    }
}
