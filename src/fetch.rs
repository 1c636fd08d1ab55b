//! Single-shot HTTP fetching.
//!
//! [`Fetcher`] is the seam between the scheduler and the network: the
//! production [`HttpFetcher`] wraps one pooled `reqwest::Client` shared by
//! every in-flight request, and tests substitute scripted fetchers. A
//! fetcher performs exactly one GET, never retries, and never looks at the
//! body beyond decoding it as text.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::ScrapeConfig;

/// Failure of a fetch, classified for the retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS, TLS, timeout, or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Every allowed attempt failed transiently.
    #[error("gave up after {attempts} attempts (last error: {last})")]
    RetryExhausted { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Network errors and 5xx responses may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Http { status } => *status >= 500,
            FetchError::RetryExhausted { .. } => false,
        }
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url`, returning the body on a 2xx response.
    async fn get(&self, url: &str) -> Result<String, FetchError>;
}

/// Production fetcher backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ScrapeConfig) -> Result<Self, FetchError> {
        Self::new(&config.user_agent, config.timeout())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

/// Upstream page URL for one game id.
pub fn game_url(base_url: &str, game_id: u32) -> String {
    format!("{}?game_id={}", base_url, game_id)
}
