//! Retry with exponential back-off for text-generation calls.
//!
//! Only errors whose message mentions the transient vocabulary (rate limit,
//! quota, timeout, temporary) are retried; everything else is terminal on
//! the first failure. No jitter is applied, so the schedule is reproducible.

use std::future::Future;
use std::time::Duration;

use aivis_core::{AppConfig, Backend};

use crate::error::LlmError;
use crate::generator::TextGenerator;

const TRANSIENT_TERMS: [&str; 4] = ["rate limit", "quota", "timeout", "temporary"];

/// Returns `true` when `message` reads like a transient failure.
#[must_use]
pub fn is_transient_message(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_TERMS.iter().any(|term| lowered.contains(term))
}

#[must_use]
pub fn is_transient(err: &LlmError) -> bool {
    is_transient_message(&err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.llm_max_attempts.max(1),
            backoff_base: Duration::from_secs(config.llm_retry_backoff_base_secs),
        }
    }

    /// Sleep after the `attempt`-th failure (1-based): `base × 2^(attempt-1)`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(factor)
    }
}

/// Runs `operation` until it succeeds, fails terminally, or the policy's
/// attempts are exhausted. The last error is returned unchanged.
///
/// # Errors
///
/// Returns the first non-transient error, or the last transient one.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || attempt >= policy.max_attempts {
                    if attempt > 1 {
                        tracing::error!(attempt, error = %err, "text generation failed after retries");
                    }
                    return Err(err);
                }
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient text generation error, retrying after back-off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Invokes `generator` through [`retry_with_backoff`].
///
/// # Errors
///
/// Returns the final [`LlmError`] once retries are exhausted or a terminal
/// error occurs.
pub async fn invoke_with_retry<G>(
    generator: &G,
    policy: RetryPolicy,
    backend: Backend,
    prompt: &str,
    temperature: f64,
) -> Result<String, LlmError>
where
    G: TextGenerator + ?Sized,
{
    retry_with_backoff(policy, || generator.invoke(backend, prompt, temperature)).await
}
