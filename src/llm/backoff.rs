//! Bounded HTTP retry with exponential backoff.
//!
//! [`BackoffPolicy::send`] re-issues a request when the transport fails or
//! the response status is in the retryable set, sleeping
//! `base * 2^(n-1)` before the n-th retry.  A `Retry-After` header (in
//! seconds) on a retryable response replaces the computed delay.

use std::time::Duration;

use reqwest::{header::RETRY_AFTER, RequestBuilder, Response};

use crate::config::GeminiConfig;
use crate::llm::client::LlmError;

/// Upper bound on a server-provided `Retry-After`.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Retries on top of the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base: Duration,
    /// Statuses that are retried.
    pub retry_statuses: Vec<u16>,
}

impl BackoffPolicy {
    pub fn from_config(config: &GeminiConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base: Duration::from_millis(config.backoff_base_ms),
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base.saturating_mul(1u32 << exp)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Send the request built by `build`, retrying per policy.
    ///
    /// Returns the last response when retries run out on a retryable status;
    /// the caller decides what a non-success status means.  Transport errors
    /// that outlast the retries are returned as [`LlmError`].
    pub async fn send<F>(&self, build: F) -> Result<Response, LlmError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retry = 0u32;
        loop {
            match build().send().await {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if !self.is_retryable_status(status) || retry >= self.max_retries {
                        return Ok(resp);
                    }
                    retry += 1;
                    let delay = retry_after(&resp).unwrap_or_else(|| self.delay_for(retry));
                    log::warn!(
                        "Upstream returned {status}; retry {retry}/{} in {}ms",
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if retry >= self.max_retries {
                        return Err(e.into());
                    }
                    retry += 1;
                    let delay = self.delay_for(retry);
                    log::warn!(
                        "Upstream request failed ({e}); retry {retry}/{} in {}ms",
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn retry_after(resp: &Response) -> Option<Duration> {
    let secs: u64 = resp
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
