//! Retry and backoff policy.
//!
//! The policy is pure: it answers "may this attempt be retried?" and "how
//! long to wait?". The executor owns the loop and the call deadline.

use std::time::Duration;

use rand::Rng;

use crate::{Error, Response};

/// Bounded exponential backoff with jitter.
///
/// By default a call gets 3 attempts in total and retries:
/// - transport failures (connection refused or reset, I/O timeout)
/// - 5xx server errors
/// - 429 Too Many Requests, honouring `Retry-After`
///
/// # Example
///
/// ```
/// use billow_core::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(5)
///     .with_base_delay(Duration::from_millis(50))
///     .with_max_delay(Duration::from_secs(2));
/// assert_eq!(policy.max_attempts(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` attempts in total (at least 1).
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Delay before the first retry.
    #[must_use]
    pub const fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Upper bound of any single backoff delay.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts allowed, the first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns `true` if another attempt is allowed after `attempt` attempts.
    #[must_use]
    pub const fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Returns `true` if the response status warrants a retry.
    #[must_use]
    pub const fn should_retry_response(response: &Response) -> bool {
        response.is_retryable()
    }

    /// Returns `true` if the error warrants a retry.
    #[must_use]
    pub const fn should_retry_error(error: &Error) -> bool {
        error.is_retryable()
    }

    /// Delay before the attempt following failed attempt number `attempt`.
    ///
    /// `base * 2^(attempt - 1)` capped at the maximum delay. With jitter the
    /// delay is drawn uniformly from its upper half. A server-provided
    /// `Retry-After` replaces the computed value, still capped.
    #[must_use]
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(requested) = retry_after {
            return requested.min(self.max_delay);
        }

        let exponent = attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);

        if self.jitter && !delay.is_zero() {
            let half = delay / 2;
            half + rand::thread_rng().gen_range(Duration::ZERO..=half)
        } else {
            delay
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert2::check;
    use bytes::Bytes;

    use super::*;
    use crate::ApiError;

    fn fixed() -> RetryPolicy {
        RetryPolicy::default()
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(1))
            .with_jitter(false)
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        check!(policy.max_attempts() == 3);
        check!(policy.has_attempts_left(2));
        check!(!policy.has_attempts_left(3));
    }

    #[test]
    fn at_least_one_attempt() {
        check!(RetryPolicy::new(0).max_attempts() == 1);
        check!(!RetryPolicy::none().has_attempts_left(1));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let policy = fixed();
        check!(policy.backoff(1, None) == Duration::from_millis(100));
        check!(policy.backoff(2, None) == Duration::from_millis(200));
        check!(policy.backoff(3, None) == Duration::from_millis(400));
        check!(policy.backoff(5, None) == Duration::from_secs(1));
        check!(policy.backoff(u32::MAX, None) == Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_in_upper_half() {
        let policy = fixed().with_jitter(true);
        for _ in 0..100 {
            let delay = policy.backoff(3, None);
            check!(delay >= Duration::from_millis(200));
            check!(delay <= Duration::from_millis(400));
        }
    }

    #[test]
    fn retry_after_wins_but_is_capped() {
        let policy = fixed();
        check!(policy.backoff(1, Some(Duration::from_millis(700))) == Duration::from_millis(700));
        check!(policy.backoff(1, Some(Duration::from_secs(30))) == Duration::from_secs(1));
    }

    #[test]
    fn should_retry_5xx_and_429_responses() {
        for status in [429, 500, 502, 503] {
            let response = Response::new(status, HashMap::default(), Bytes::new());
            check!(RetryPolicy::should_retry_response(&response));
        }
    }

    #[test]
    fn should_not_retry_other_responses() {
        for status in [200, 400, 401, 404, 409, 422] {
            let response = Response::new(status, HashMap::default(), Bytes::new());
            check!(!RetryPolicy::should_retry_response(&response));
        }
    }

    #[test]
    fn should_retry_transport_error() {
        check!(RetryPolicy::should_retry_error(&Error::transport("connection refused")));
        check!(RetryPolicy::should_retry_error(&Error::from(ApiError::new(503, "down"))));
        check!(!RetryPolicy::should_retry_error(&Error::Timeout { attempts: 1 }));
        check!(!RetryPolicy::should_retry_error(&Error::from(ApiError::new(404, "gone"))));
    }
}
