//! Client configuration.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for a service client connection.
///
/// Timeouts are deliberately short-ish by default: a caller that cannot
/// reach a service must learn that quickly and classify the outcome, not
/// hang a request chain.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Maximum time to establish the connection.
    pub connect_timeout: Duration,
    /// Per-call deadline.
    pub request_timeout: Duration,
    /// Retry policy for read-only, idempotent operations.
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Overrides the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Overrides the per-call deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Overrides the read-retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
