//! Bounded-backoff retry for read-only operations.
//!
//! Only reads and other idempotent calls go through [`with_retry`]; mutating
//! calls (registry `add`/`remove`, entity create/delete) must not, because a
//! transport failure there leaves the outcome unknown.

use std::time::Duration;

use crate::error::{Result, SdkError};

/// Retry policy: bounded attempts with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Backoff delay before the given retry attempt (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails non-retryably, or attempts run out.
///
/// On exhaustion returns [`SdkError::RetryExhausted`] carrying the last
/// error's description.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error: Option<SdkError> = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                tracing::debug!(attempt, error = %err, "retryable error, backing off");
                tokio::time::sleep(policy.delay(attempt)).await;
                last_error = Some(err);
            },
            Err(err) if err.is_retryable() => {
                return Err(SdkError::RetryExhausted {
                    attempts: policy.max_attempts,
                    last_error: err.to_string(),
                });
            },
            Err(err) => return Err(err),
        }
    }

    // Reached only when max_attempts is 0 and clamped to 1 attempt failing.
    Err(SdkError::RetryExhausted {
        attempts: policy.max_attempts.max(1),
        last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn transient() -> SdkError {
        SdkError::from(tonic::Status::unavailable("down"))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let policy = RetryPolicy::default();
        let result: Result<i32> = with_retry(&policy, || async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let calls = AtomicU32::new(0);

        let result = with_retry(&policy, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_last_error() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
        };

        let result: Result<()> = with_retry(&policy, || async { Err(transient()) }).await;
        match result.unwrap_err() {
            SdkError::RetryExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected RetryExhausted, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_none_policy_gives_single_attempt() {
        let policy = RetryPolicy::none();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_error_returns_immediately() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SdkError::from(tonic::Status::not_found("missing")))
        })
        .await;

        assert!(matches!(result.unwrap_err(), SdkError::Rpc { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_indeterminate_never_retried() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SdkError::from_status_nonidempotent(
                tonic::Status::unavailable("cut"),
                "add",
            ))
        })
        .await;

        assert!(matches!(result.unwrap_err(), SdkError::Indeterminate { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
