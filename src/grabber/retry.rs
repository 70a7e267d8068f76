use crate::observability::GrabMetrics;
use crate::storage::StorageError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BACKOFF: u32 = 2;
pub const DEFAULT_DELAY_SECS: u64 = 3;

/// How often and how patiently a grabber retries transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, never below 1
    pub attempts: u32,
    /// Wait before the first retry
    pub delay: Duration,
    /// Multiplier applied to the wait after every retry
    pub backoff: u32,
}

impl RetryPolicy {
    pub fn from_repo(retries: Option<u32>, backoff: Option<u32>, delay: Option<u64>) -> Self {
        Self {
            attempts: retries.unwrap_or(1).max(1),
            delay: Duration::from_secs(delay.unwrap_or(DEFAULT_DELAY_SECS)),
            backoff: backoff.unwrap_or(DEFAULT_BACKOFF),
        }
    }

    /// Wait before retry number `retry` (1-based): delay, delay*backoff, ...
    pub fn wait_before(&self, retry: u32) -> Duration {
        let factor = self.backoff.saturating_pow(retry.saturating_sub(1));
        self.delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    /// The last error is returned as the storage client produced it.
    pub async fn run<T, F, Fut>(&self, key: &str, metrics: &GrabMetrics, mut op: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(key, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let wait = self.wait_before(attempt);
                    warn!(key, attempt, error = %e, wait_ms = wait.as_millis() as u64, "Storage request failed, retrying");
                    metrics.retried();
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    metrics.failed();
                    return Err(e);
                }
            }
        }
    }
}
