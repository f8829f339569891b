use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delays applied by the fetch client.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry budget per page, counted separately for 429s and timeouts
    pub max_retries: u32,
    /// First 429 backoff; doubles with each retry
    pub rate_limit_base: Duration,
    /// Fixed wait after a transport timeout
    pub timeout_delay: Duration,
    /// Pause between consecutive pages
    pub page_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            rate_limit_base: Duration::from_secs(1),
            timeout_delay: Duration::from_secs(2),
            page_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Backoff before 429 retry number `retry` (0-based): `base * 2^retry`.
    pub fn rate_limit_delay(&self, retry: u32) -> Duration {
        self.rate_limit_base * (1u32 << retry.min(16))
    }
}

/// Wall-clock waits, swappable so tests can record instead of sleep.
#[async_trait]
pub trait Delay: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
