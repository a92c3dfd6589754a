//! A single composable retry policy, collapsing the ad hoc retry loops the
//! source scattered across the LLM client, video client, and critic parsers
//! into one place (§9 "Retry policy").

use crate::error::CoreError;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
    pub jitter: f64,
}

impl RetryPolicy {
    /// Default policy for LLM calls: up to 3 retries, base 1s, factor 2,
    /// jitter +-20% (§4.5, §7).
    pub fn network_default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            jitter: 0.2,
        }
    }

    /// Default policy for critic/cohesor parse retries: up to 3 attempts,
    /// no real backoff needed since these are local reformatting retries
    /// rather than network retries (§4.7).
    pub fn parse_default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(0),
            backoff_factor: 1.0,
            jitter: 0.0,
        }
    }

    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let jitter_span = base * self.jitter;
        let jittered = if jitter_span > 0.0 {
            let offset = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
            (base + offset).max(0.0)
        } else {
            base
        };
        Duration::from_secs_f64(jittered)
    }

    /// Run `f` until it succeeds, the attempt budget is exhausted, or it
    /// returns a non-retryable error. `is_retryable` lets callers override
    /// `CoreError::is_retryable` (e.g. the critic parser treats
    /// `AgentMalformed` as retryable, which the default predicate does not).
    pub async fn retry<F, Fut, T>(&self, mut f: F) -> Result<T, CoreError>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        self.retry_with(&CoreError::is_retryable, &mut f).await
    }

    pub async fn retry_with<F, Fut, T>(
        &self,
        is_retryable: &dyn Fn(&CoreError) -> bool,
        f: &mut F,
    ) -> Result<T, CoreError>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut last_err = None;
        for attempt in 0..self.max_attempts {
            match f(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if !is_retryable(&e) {
                        return Err(e);
                    }
                    tracing::warn!(attempt, error = %e, "retrying after recoverable error");
                    last_err = Some(e);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(self.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| CoreError::UpstreamUnavailable("retry budget exhausted".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_then_succeeds() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            jitter: 0.0,
        };
        let calls = AtomicU32::new(0);
        let result = policy
            .retry(|attempt| {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(CoreError::TransientNetwork("boom".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_fast() {
        let policy = RetryPolicy::network_default();
        let calls = AtomicU32::new(0);
        let result: Result<(), CoreError> = policy
            .retry(|_| {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::UpstreamContentRejected("policy".into()))
                }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            jitter: 0.0,
        };
        let result: Result<(), CoreError> = policy
            .retry(|_| async { Err(CoreError::TransientNetwork("down".into())) })
            .await;
        assert!(matches!(result, Err(CoreError::TransientNetwork(_))));
    }
}
