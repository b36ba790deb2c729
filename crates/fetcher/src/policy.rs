//! Backoff schedule for retried external calls.

use std::time::Duration;

/// How often, and how patiently, an external call is retried.
///
/// After a failed attempt number `n` (0-based) the fetcher waits
/// `initial_delay * backoff_multiplier^n` before trying again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    /// Upper bound for a single attempt, applied before any backoff
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            ..Self::default()
        }
    }

    /// Configure the per-attempt timeout (default: 10s)
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Total number of calls the fetcher may make
    pub fn total_attempts(&self) -> u32 {
        self.max_attempts.saturating_add(1)
    }

    /// Delay to wait after failed attempt `retry` (0-based).
    ///
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Every delay the fetcher may sleep, in order
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts).map(|n| self.delay_for_retry(n)).collect()
    }

    /// Sum of the backoff series
    pub fn total_backoff(&self) -> Duration {
        self.schedule()
            .into_iter()
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Longest a single retried call can take: every attempt timing out
    /// plus the full backoff series.
    pub fn worst_case(&self) -> Duration {
        self.attempt_timeout
            .saturating_mul(self.total_attempts())
            .saturating_add(self.total_backoff())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000),
            ]
        );
        assert_eq!(policy.total_backoff(), Duration::from_millis(7000));
        assert_eq!(policy.total_attempts(), 4);
    }

    #[test]
    fn test_fractional_multiplier() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100), 1.5);
        assert_eq!(policy.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(150));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), 1e300);
        assert_eq!(policy.delay_for_retry(5), Duration::MAX);
        assert_eq!(policy.worst_case(), Duration::MAX);
    }

    #[test]
    fn test_no_retry() {
        let policy = RetryPolicy::no_retry();
        assert!(policy.schedule().is_empty());
        assert_eq!(policy.total_attempts(), 1);
        assert_eq!(policy.worst_case(), policy.attempt_timeout);
    }

    #[test]
    fn test_worst_case_budget() {
        let policy = RetryPolicy::default().with_attempt_timeout(Duration::from_secs(2));
        // 4 attempts * 2s + (1 + 2 + 4)s
        assert_eq!(policy.worst_case(), Duration::from_secs(15));
    }
}
