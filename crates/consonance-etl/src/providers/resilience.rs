//! Resilience primitives for provider clients.

use std::future::Future;
use std::sync::Arc;

use backon::{ExponentialBuilder, Retryable};
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

use crate::error::ProviderResult;

/// Per-client rate limiter.
///
/// Spaces requests at least `1 / requests_per_second` apart. Clones share
/// the same schedule.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    next_slot: Arc<Mutex<Instant>>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a limiter allowing at most `requests_per_second` requests
    /// per second (clamped to at least one).
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            next_slot: Arc::new(Mutex::new(Instant::now())),
            interval: Duration::from_millis(1000 / u64::from(requests_per_second.max(1))),
        }
    }

    /// Waits until the next request slot.
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let slot = (*next).max(Instant::now());
            *next = slot + self.interval;
            slot
        };
        sleep_until(slot).await;
    }
}

/// Retry schedule for transient provider failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(4),
        }
    }
}

impl RetryPolicy {
    /// No retries; used by tests against mock servers.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
pub async fn with_retry<T, F, Fut>(source_name: &str, policy: RetryPolicy, op: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    op.retry(policy.backoff())
        .when(|e| e.is_transient())
        .notify(|e, delay| {
            log::warn!("{} call failed ({}), retrying in {:?}", source_name, e, delay);
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_rate_limiter_spaces_requests() {
        let limiter = RateLimiter::new(20);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // first slot is immediate, the next two wait one interval each
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_errors() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let policy = RetryPolicy {
            max_retries: 3,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        };
        let result = with_retry("test", policy, || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProviderError::RateLimited {
                    source_name: "test".to_string(),
                })
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_permanent_errors() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let result: ProviderResult<()> = with_retry("test", RetryPolicy::default(), || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::NotFound {
                entity: "track".to_string(),
                source_name: "test".to_string(),
            })
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
