//! Resilient HTTP call wrapper with exponential backoff on rate limits.
//!
//! Shared by every completion-endpoint caller. Only HTTP 429 is retried;
//! any other response is returned to the caller as-is, and transport
//! failures propagate without consuming the retry budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use thiserror::Error;

use crate::core::errors::PipelineError;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("rate limit exhausted after {attempts} attempts calling {endpoint}")]
    RateLimited { endpoint: String, attempts: u32 },

    #[error("request failed: {0}")]
    Transport(String),
}

impl From<CallError> for PipelineError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::RateLimited { endpoint, attempts } => {
                PipelineError::RateLimitExhausted { endpoint, attempts }
            }
            CallError::Transport(msg) => PipelineError::Completion(msg),
        }
    }
}

/// Backoff policy: `base_delay * 2^attempt` before retry number `attempt + 1`.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Injectable sleep so tests can observe the backoff schedule.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Clone)]
pub struct ResilientClient {
    http: reqwest::Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ResilientClient {
    pub fn new(http: reqwest::Client, policy: RetryPolicy) -> Self {
        Self::with_sleeper(http, policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        http: reqwest::Client,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            http,
            policy,
            sleeper,
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Send the request, retrying 429 responses per the policy.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, CallError> {
        let request = request
            .build()
            .map_err(|e| CallError::Transport(e.to_string()))?;
        let endpoint = request.url().to_string();

        let mut attempt = 0u32;
        loop {
            let cloned = request.try_clone().ok_or_else(|| {
                CallError::Transport("request body is not cloneable for retry".to_string())
            })?;

            let response = self
                .http
                .execute(cloned)
                .await
                .map_err(|e| CallError::Transport(e.to_string()))?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            attempt += 1;
            if attempt >= self.policy.max_attempts {
                return Err(CallError::RateLimited {
                    endpoint,
                    attempts: self.policy.max_attempts,
                });
            }

            let delay = self.policy.delay_for(attempt - 1);
            tracing::warn!(
                "Rate limited by {} (attempt {}/{}), waiting {:?}",
                endpoint,
                attempt,
                self.policy.max_attempts,
                delay
            );
            self.sleeper.sleep(delay).await;
        }
    }
}
