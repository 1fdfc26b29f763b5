//! Bounded retry with linear backoff, plus fixed inter-request pacing.

use std::time::{Duration, Instant};

use ecl_model::Result;
use tracing::warn;

/// Retry policy for transient network failures.
///
/// Delay grows linearly: attempt 1 waits `base_delay`, attempt 2 waits
/// `2 * base_delay`, and so on. Non-retryable errors are returned on the
/// first occurrence regardless of remaining attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or exhausts attempts.
    pub fn execute<T, F>(&self, label: &str, op: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        self.execute_with_sleep(label, op, std::thread::sleep)
    }

    /// Same as [`execute`](Self::execute) with the sleep injected, so tests
    /// can observe delays without waiting for them.
    pub fn execute_with_sleep<T, F, S>(&self, label: &str, mut op: F, mut sleep: S) -> Result<T>
    where
        F: FnMut() -> Result<T>,
        S: FnMut(Duration),
    {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.base_delay * attempt;
                    warn!(
                        label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Fixed delay between consecutive requests.
///
/// Public terminology servers throttle aggressive clients; a fixed pause is
/// enough for a sequential pipeline. `None` disables pacing entirely.
#[derive(Debug)]
pub struct Pacer {
    delay: Option<Duration>,
    last_request: Option<Instant>,
}

impl Pacer {
    #[must_use]
    pub fn new(delay: Option<Duration>) -> Self {
        Self {
            delay,
            last_request: None,
        }
    }

    /// Block until the configured gap since the previous call has elapsed.
    pub fn pace(&mut self) {
        if let (Some(delay), Some(last)) = (self.delay, self.last_request) {
            let elapsed = last.elapsed();
            if elapsed < delay {
                std::thread::sleep(delay - elapsed);
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecl_model::TermError;

    fn transient() -> TermError {
        TermError::TransientNetwork("connection reset".to_string())
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        let mut sleeps = Vec::new();
        let mut calls = 0;

        let result = policy.execute_with_sleep(
            "expand",
            || {
                calls += 1;
                if calls < 3 { Err(transient()) } else { Ok(calls) }
            },
            |d| sleeps.push(d),
        );

        assert_eq!(result.unwrap(), 3);
        // Linear backoff: 100ms, then 200ms.
        assert_eq!(
            sleeps,
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[test]
    fn exhausts_attempts_on_persistent_transient_failure() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let mut calls = 0;

        let result: Result<()> = policy.execute_with_sleep(
            "expand",
            || {
                calls += 1;
                Err(transient())
            },
            |_| {},
        );

        assert_eq!(calls, 3);
        assert!(result.unwrap_err().is_retryable());
    }

    #[test]
    fn non_retryable_errors_fail_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let mut calls = 0;
        let mut sleeps = 0;

        let result: Result<()> = policy.execute_with_sleep(
            "expand",
            || {
                calls += 1;
                Err(TermError::Authentication("bad certificate".to_string()))
            },
            |_| sleeps += 1,
        );

        assert_eq!(calls, 1);
        assert_eq!(sleeps, 0);
        assert!(result.is_err());
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        let result = policy.execute_with_sleep("expand", || Ok(42), |_| {});
        assert_eq!(result.unwrap(), 42);
    }
}
