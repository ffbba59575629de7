//! Bounded constant-delay retry for transient provider failures.
//!
//! Only transcription is wrapped in practice: it uploads a large binary
//! payload over the route most prone to connection resets, while the chat
//! and image calls are small JSON round-trips. Widening the coverage is a
//! policy change, not a technical one.

use crate::error::ProviderResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy: total attempts and the fixed delay between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (default: 3).
    pub max_attempts: u32,
    /// Constant delay between attempts, no backoff growth (default: 1s).
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Invoke `op`, retrying while the failure is transient and attempts remain.
/// Non-transient failures and the final attempt's failure propagate unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    attempt,
                    remaining = policy.max_attempts - attempt,
                    error = %err,
                    "transient provider failure, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Instant;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn succeeds_after_two_transient_failures() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let policy = fast_policy();
        let result = with_retry(&policy, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(ProviderError::Connectivity("read ECONNRESET".into()))
                } else {
                    Ok("transcript")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "transcript");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Two sleeps of `delay` must have elapsed between the attempts.
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn non_transient_failure_propagates_without_delay() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let policy = fast_policy();
        let result: ProviderResult<&str> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::Provider {
                    status: 401,
                    message: "invalid_api_key".into(),
                })
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(ProviderError::Provider { status: 401, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(20));
    }

    #[tokio::test]
    async fn exhausted_attempts_propagate_the_final_failure() {
        let calls = AtomicU32::new(0);
        let policy = fast_policy();
        let result: ProviderResult<&str> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Connectivity("connect failed".into())) }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Connectivity(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
