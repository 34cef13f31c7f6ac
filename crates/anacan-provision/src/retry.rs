//! Retry-wrapped resource operation.
//!
//! One idempotent remote call, attempted up to `max_attempts` times. Only
//! transport failures are retried; a conflict short-circuits to
//! `AlreadyExists` and any other error fails the resource at once.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn};

use anacan_shared::constants::{
    DEFAULT_JITTER_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_MS, DEFAULT_RETRY_MAX_MS,
};
use anacan_shared::{FailureReason, ProvisioningOutcome};

use crate::error::{ErrorClass, RemoteError};

/// Retry budget and pacing, shared by every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure; grows linearly with each attempt.
    pub base_delay: Duration,
    /// Upper bound of the delay before jitter.
    pub max_delay: Duration,
    /// Random extra delay in `0..=jitter`.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_MS),
            jitter: Duration::from_millis(DEFAULT_JITTER_MS),
        }
    }
}

impl RetryPolicy {
    /// Same budget, no waiting. Used by tests and dry runs.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay before attempt `failed_attempts + 1`.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        let linear = self.base_delay.saturating_mul(failed_attempts.max(1));
        let capped = linear.min(self.max_delay);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return capped;
        }
        capped + Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

/// Run `operation`, retrying transport failures within the policy budget.
///
/// Returns the last error once the budget is spent, or the first
/// non-transient error without retrying.
pub async fn call_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    resource: &str,
    mut operation: F,
) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(resource, attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.class() == ErrorClass::Transient && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    resource,
                    attempt,
                    max_attempts,
                    ?delay,
                    error = %e,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Run one idempotent create call and classify its outcome.
///
/// Never returns an error: network exhaustion and rejections are reported as
/// [`ProvisioningOutcome::Failed`] so the caller can carry on with the next
/// resource.
pub async fn run_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    resource: &str,
    operation: F,
) -> ProvisioningOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    match call_with_retry(policy, resource, operation).await {
        Ok(_) => {
            info!(resource, "Created");
            ProvisioningOutcome::Created
        }
        Err(e) => match e.class() {
            ErrorClass::AlreadyExists => {
                info!(resource, "Already exists, skipping");
                ProvisioningOutcome::AlreadyExists
            }
            ErrorClass::Transient => {
                error!(resource, error = %e, "Giving up after network failures");
                ProvisioningOutcome::Failed(FailureReason::Network)
            }
            ErrorClass::Fatal => {
                error!(resource, error = %e, "Operation rejected");
                ProvisioningOutcome::Failed(FailureReason::Other(e.to_string()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn transient() -> RemoteError {
        RemoteError::Transport("connection reset".into())
    }

    /// Fails with a transport error `failures` times, then succeeds.
    async fn flaky(calls: &AtomicU32, failures: u32) -> Result<(), RemoteError> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(transient())
        } else {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_succeeds_when_failures_below_budget() {
        for failures in 0..3 {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let outcome = run_with_retry(&RetryPolicy::immediate(3), "x", move || {
                flaky(counter, failures)
            })
            .await;
            assert_eq!(outcome, ProvisioningOutcome::Created, "failures = {failures}");
            assert_eq!(calls.load(Ordering::SeqCst), failures + 1);
        }
    }

    #[tokio::test]
    async fn test_fails_with_network_when_budget_spent() {
        for failures in [3, 4, 10] {
            let calls = AtomicU32::new(0);
            let counter = &calls;
            let outcome = run_with_retry(&RetryPolicy::immediate(3), "x", move || {
                flaky(counter, failures)
            })
            .await;
            assert_eq!(
                outcome,
                ProvisioningOutcome::Failed(FailureReason::Network),
                "failures = {failures}"
            );
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }
    }

    #[tokio::test]
    async fn test_conflict_short_circuits_without_delay() {
        // A long delay would trip the timeout if the wrapper slept.
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
            max_delay: Duration::from_secs(60),
            jitter: Duration::ZERO,
        };
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            run_with_retry(&policy, "posts", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(RemoteError::api(409, "collection_already_exists", "exists"))
            }),
        )
        .await
        .expect("conflict must not wait");

        assert_eq!(outcome, ProvisioningOutcome::AlreadyExists);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let outcome = run_with_retry(&RetryPolicy::immediate(3), "posts.slug", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(RemoteError::api(400, "attribute_invalid", "bad size"))
        })
        .await;

        assert!(matches!(
            outcome,
            ProvisioningOutcome::Failed(FailureReason::Other(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_conflict_after_transient_failure() {
        // The first request went through but its response was lost.
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let outcome = run_with_retry(&RetryPolicy::immediate(3), "posts", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err::<(), _>(transient())
            } else {
                Err(RemoteError::api(409, "collection_already_exists", "exists"))
            }
        })
        .await;
        assert_eq!(outcome, ProvisioningOutcome::AlreadyExists);
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1500),
            max_delay: Duration::from_millis(3000),
            jitter: Duration::ZERO,
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(1500));
        assert_eq!(policy.delay_after(2), Duration::from_millis(3000));
        assert_eq!(policy.delay_after(4), Duration::from_millis(3000));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let policy = RetryPolicy {
            jitter: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        for _ in 0..50 {
            let d = policy.delay_after(1);
            assert!(d >= policy.base_delay);
            assert!(d <= policy.base_delay + Duration::from_millis(100));
        }
    }
}
