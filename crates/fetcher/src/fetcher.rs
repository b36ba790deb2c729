//! Bounded retry loop around external calls.

use std::future::Future;

use anyhow::anyhow;
use tracing::{debug, error, info, warn};

use crate::error::{is_permanent, RetryError};
use crate::policy::RetryPolicy;

/// Wraps calls to external, possibly flaky endpoints (HTTP requests,
/// database queries) with a per-attempt timeout and exponential backoff.
///
/// Cheap to clone; holds no state between calls.
#[derive(Debug, Clone, Default)]
pub struct RetryingFetcher {
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `call` until it succeeds, fails permanently, or the policy's
    /// attempts are used up.
    ///
    /// `call` is invoked once per attempt so each attempt gets a fresh future.
    /// The last error is always surfaced; nothing is swallowed.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let total_attempts = self.policy.total_attempts();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(operation, attempt, "calling external service");

            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "attempt timed out after {:?}",
                    self.policy.attempt_timeout
                )),
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "external call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            let cause = format!("{:#}", err);
            if is_permanent(&err) {
                warn!(operation, attempt, error = %cause, "external call failed permanently");
                return Err(RetryError {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last_error: err,
                });
            }

            if attempt >= total_attempts {
                error!(operation, attempts = attempt, error = %cause, "external call failed after all retries");
                return Err(RetryError {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last_error: err,
                });
            }

            let delay = self.policy.delay_for_retry(attempt - 1);
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %cause,
                "external call failed, retrying after delay"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
