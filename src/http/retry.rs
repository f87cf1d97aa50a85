//! Retry engine (§4.C): composable backoff strategies plus the retry-or-not
//! decision for a given status code. Grounded in the teacher's `max_retries`
//! loop in `DiscordHttpClient::request`, generalized into a standalone,
//! reusable policy per §4.C's "backoff is a value, not a loop hardcoded into
//! the client".

use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// A composable backoff strategy. Recursive variants let a strategy fall
/// back to another one, e.g. "honor `Retry-After` if present, else back off
/// exponentially".
#[derive(Debug, Clone)]
pub enum Backoff {
    Constant(Duration),
    Linear { base: Duration, increment: Duration },
    Exponential { base: Duration, max: Duration },
    /// Use the `Retry-After` value from the response if one was given;
    /// otherwise defer to the boxed fallback strategy.
    RetryAfterHeader {
        retry_after: Option<Duration>,
        fallback: Box<Backoff>,
    },
}

impl Backoff {
    /// The delay before attempt number `attempt` (1-indexed: the first
    /// retry is attempt 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Constant(d) => *d,
            Backoff::Linear { base, increment } => *base + *increment * attempt.saturating_sub(1),
            Backoff::Exponential { base, max } => {
                let scaled = base.saturating_mul(1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX));
                scaled.min(*max)
            }
            Backoff::RetryAfterHeader { retry_after, fallback } => {
                retry_after.unwrap_or_else(|| fallback.delay(attempt))
            }
        }
    }
}

/// A caller-configurable retry policy (§4.C): which statuses are retryable,
/// how many times, whether a bare transport error earns a retry, and the
/// backoff strategy to fall back to once `Retry-After` is absent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub statuses: Vec<u16>,
    pub max_retries: u32,
    pub retry_connection_errors: bool,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// `should_retry(status, attempts) = attempts < max_retries ∧ status ∈ statuses`.
    pub fn should_retry(&self, status: u16, attempt: u32) -> bool {
        attempt < self.max_retries && self.statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            max_retries: DEFAULT_MAX_ATTEMPTS,
            retry_connection_errors: true,
            backoff: Backoff::Exponential {
                base: Duration::from_millis(200),
                max: Duration::from_secs(10),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_backoff_never_changes() {
        let backoff = Backoff::Constant(Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(5), Duration::from_millis(100));
    }

    #[test]
    fn linear_backoff_grows_by_increment() {
        let backoff = Backoff::Linear {
            base: Duration::from_millis(100),
            increment: Duration::from_millis(50),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(3), Duration::from_millis(200));
    }

    #[test]
    fn exponential_backoff_caps_at_max() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            max: Duration::from_secs(1),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(10), Duration::from_secs(1));
    }

    #[test]
    fn retry_after_header_wins_when_present() {
        let backoff = Backoff::RetryAfterHeader {
            retry_after: Some(Duration::from_secs(3)),
            fallback: Box::new(Backoff::Constant(Duration::from_millis(1))),
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(3));
    }

    #[test]
    fn retry_after_header_falls_back_when_absent() {
        let backoff = Backoff::RetryAfterHeader {
            retry_after: None,
            fallback: Box::new(Backoff::Constant(Duration::from_millis(250))),
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(250));
    }

    #[test]
    fn retryable_statuses_stop_after_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(503, 0));
        assert!(!policy.should_retry(503, policy.max_retries));
    }

    #[test]
    fn client_errors_are_never_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(404, 0));
        assert!(!policy.should_retry(401, 0));
    }

    #[test]
    fn custom_policy_can_narrow_or_widen_retryable_statuses() {
        let policy = RetryPolicy {
            statuses: vec![503],
            max_retries: 2,
            retry_connection_errors: false,
            backoff: Backoff::Constant(Duration::from_millis(1)),
        };
        assert!(policy.should_retry(503, 0));
        assert!(!policy.should_retry(429, 0));
        assert!(!policy.should_retry(503, 2));
    }
}
