//! Retry with exponential backoff around a [`Fetcher`].
//!
//! Strategy:
//! - network error or HTTP 5xx → sleep `base × 2^attempt` and try again
//!   (attempts count from 0, so the default base gives 1s, 2s, 4s, ...)
//! - HTTP 4xx → return immediately
//! - after `max_attempts` transient failures → [`FetchError::RetryExhausted`]
//!
//! Each attempt inherits the fetcher's own timeout; there is no deadline
//! across attempts.

use std::time::Duration;

use crate::config::ScrapeConfig;
use crate::fetch::{FetchError, Fetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.backoff_base(),
        }
    }

    /// Sleep after the failed attempt with index `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

pub async fn get_with_retry(
    fetcher: &dyn Fetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<String, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..max_attempts {
        match fetcher.get(url).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() => {
                if attempt + 1 < max_attempts {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        url,
                        attempt = attempt + 1,
                        max_attempts,
                        error = %e,
                        "transient fetch failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    tracing::warn!(url, max_attempts, error = %e, "transient fetch failure, giving up");
                }
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(FetchError::RetryExhausted {
        attempts: max_attempts,
        last: Box::new(
            last_err.unwrap_or_else(|| FetchError::Network("no attempt made".to_string())),
        ),
    })
}
