//! Provider client: one logical provider call with bounded retry.
//!
//! ## Retry Strategy
//!
//! Hosted inference models are unloaded when idle and answer with a
//! "model is loading" marker until they are warm again. That condition is
//! expected to clear on its own, so it waits longer
//! (`loading_backoff_ms * attempt`) than any other failure
//! (`retry_backoff_ms * attempt`). With the defaults and 3 attempts a cold
//! model costs at most 2 s + 4 s of waiting before the chain moves on.
//!
//! Delays grow linearly with the attempt number, so the schedule for one
//! kind of failure is non-decreasing. The client does not distinguish
//! permanent from transient failures beyond that: after the final attempt
//! the last error is returned and the chain tries the next provider.

use crate::error::ProviderError;
use crate::pipeline::transport::{ProviderPayload, ProviderTransport, RawResponse};
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Attempt budget and backoff bases for one provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Base delay after a "model loading" reply.
    pub loading_backoff_ms: u64,
    /// Base delay after any other failure.
    pub retry_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            loading_backoff_ms: 2000,
            retry_backoff_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after `attempt` (1-based) failed with `error`.
    pub fn delay(&self, error: &ProviderError, attempt: u32) -> Duration {
        let base = if error.is_loading() {
            self.loading_backoff_ms
        } else {
            self.retry_backoff_ms
        };
        Duration::from_millis(base.saturating_mul(u64::from(attempt)))
    }
}

/// Issues provider calls under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct ProviderClient {
    policy: RetryPolicy,
}

impl ProviderClient {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Call `transport` until it succeeds or the attempt budget runs out.
    ///
    /// Every attempt is logged with its number, the provider and the outcome.
    /// On exhaustion the error from the final attempt is returned.
    pub async fn invoke(
        &self,
        transport: &dyn ProviderTransport,
        payload: &ProviderPayload,
    ) -> Result<RawResponse, ProviderError> {
        let provider = transport.id();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match transport.send(payload).await {
                Ok(raw) => {
                    debug!("{}: attempt {}/{} succeeded", provider, attempt, max_attempts);
                    return Ok(raw);
                }
                Err(err) if attempt >= max_attempts => {
                    warn!(
                        "{}: attempt {}/{} failed, giving up: {}",
                        provider, attempt, max_attempts, err
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.policy.delay(&err, attempt);
                    if err.is_loading() {
                        warn!(
                            "{}: model loading, attempt {}/{}, waiting {}ms",
                            provider,
                            attempt,
                            max_attempts,
                            delay.as_millis()
                        );
                    } else {
                        warn!(
                            "{}: attempt {}/{} failed, retrying in {}ms: {}",
                            provider,
                            attempt,
                            max_attempts,
                            delay.as_millis(),
                            err
                        );
                    }
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::transport::ProviderId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    struct Flaky {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ProviderTransport for Flaky {
        fn id(&self) -> ProviderId {
            ProviderId::HuggingFaceSummarizer
        }

        async fn send(&self, _payload: &ProviderPayload) -> Result<RawResponse, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures_before_success {
                Err(ProviderError::Transport {
                    provider: self.id(),
                    detail: "connection reset".into(),
                })
            } else {
                Ok(RawResponse::Text("done".into()))
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            loading_backoff_ms: 1,
            retry_backoff_ms: 1,
        }
    }

    #[test]
    fn default_policy_matches_documented_values() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.loading_backoff_ms, 2000);
        assert_eq!(p.retry_backoff_ms, 1000);
    }

    #[test]
    fn delays_scale_with_attempt() {
        let p = RetryPolicy::default();
        let loading = ProviderError::ModelLoading {
            provider: ProviderId::HuggingFaceSummarizer,
            message: "loading".into(),
        };
        let other = ProviderError::Transport {
            provider: ProviderId::HuggingFaceSummarizer,
            detail: "reset".into(),
        };
        assert_eq!(p.delay(&loading, 1), Duration::from_millis(2000));
        assert_eq!(p.delay(&loading, 2), Duration::from_millis(4000));
        assert_eq!(p.delay(&other, 1), Duration::from_millis(1000));
        assert_eq!(p.delay(&other, 3), Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let transport = Flaky {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        };
        let client = ProviderClient::new(fast_policy(3));
        let raw = client
            .invoke(&transport, &ProviderPayload::Inputs("x".into()))
            .await
            .unwrap();
        assert_eq!(raw, RawResponse::Text("done".into()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn invoke_waits_between_attempts() {
        let transport = Flaky {
            failures_before_success: 5,
            calls: AtomicU32::new(0),
        };
        let client = ProviderClient::new(RetryPolicy {
            max_attempts: 3,
            loading_backoff_ms: 1,
            retry_backoff_ms: 20,
        });

        let started = Instant::now();
        let err = client
            .invoke(&transport, &ProviderPayload::Inputs("x".into()))
            .await
            .unwrap_err();

        // 20ms after the first failure, 40ms after the second, none after the last.
        assert!(started.elapsed() >= Duration::from_millis(60));
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let transport = Flaky {
            failures_before_success: 5,
            calls: AtomicU32::new(0),
        };
        let client = ProviderClient::new(fast_policy(0));
        let err = client
            .invoke(&transport, &ProviderPayload::Inputs("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
