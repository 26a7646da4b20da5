//! # Backoff policy for scheduling job retries.
//!
//! [`BackoffPolicy`] mirrors the retry options the queue attaches to a job:
//! either a fixed delay in milliseconds, or an exponential policy whose base
//! delay doubles with each prior attempt. [`next_retry_at`] is the pure entry
//! point the monitor uses on every failure: it returns the earliest instant a
//! retry should occur, or `None` when the job is terminal.
//!
//! The exponential delay for a job with `attempts_made = n` is
//! `base × 2^(max(n - 1, 0))`: the first retry waits the base delay and each
//! subsequent retry doubles it.
//!
//! # Example
//! ```rust
//! use std::time::{Duration, SystemTime};
//! use jobwatch::{next_retry_at, BackoffPolicy};
//!
//! let policy = BackoffPolicy::Exponential { base_ms: 1000 };
//! let now = SystemTime::now();
//!
//! // First failure (1 attempt made of 3 allowed): retry after the base delay.
//! let at = next_retry_at(Some(&policy), 1, 3, now).expect("retry scheduled");
//! assert_eq!(at, now + Duration::from_millis(1000));
//!
//! // Third failure: the attempt budget is exhausted.
//! assert_eq!(next_retry_at(Some(&policy), 3, 3, now), None);
//! ```

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Retry backoff policy attached to a job by the queue.
///
/// Serializes the way the queue stores it in job options: a fixed policy is a
/// bare number of milliseconds, an exponential policy is `{"base_ms": n}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackoffPolicy {
    /// Constant delay in milliseconds before every retry.
    Fixed(u64),
    /// Delay grows with each prior attempt: `base_ms × 2^(max(attempts_made - 1, 0))`.
    Exponential {
        /// Base delay in milliseconds for the first retry.
        base_ms: u64,
    },
}

impl BackoffPolicy {
    /// Computes the delay before the retry that follows `attempts_made`
    /// failed attempts.
    ///
    /// Saturates instead of overflowing: absurdly high attempt counts yield
    /// `Duration::from_millis(u64::MAX)` rather than a panic.
    pub fn delay_for(&self, attempts_made: u32) -> Duration {
        let ms = match *self {
            BackoffPolicy::Fixed(ms) => ms,
            BackoffPolicy::Exponential { base_ms } => {
                let exp = attempts_made.saturating_sub(1);
                if exp >= 63 {
                    u64::MAX
                } else {
                    base_ms.saturating_mul(1u64 << exp)
                }
            }
        };
        Duration::from_millis(ms)
    }
}

/// Returns the earliest instant a retry should occur, or `None` when the job
/// must be treated as terminal.
///
/// Terminal cases:
/// - `attempts_made >= attempts_allowed` (budget exhausted);
/// - no policy is configured.
///
/// Deterministic given identical inputs; `now` is the only clock read and is
/// supplied by the caller.
pub fn next_retry_at(
    policy: Option<&BackoffPolicy>,
    attempts_made: u32,
    attempts_allowed: u32,
    now: SystemTime,
) -> Option<SystemTime> {
    if attempts_made >= attempts_allowed {
        return None;
    }
    let policy = policy?;
    Some(now + policy.delay_for(attempts_made))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: BackoffPolicy = BackoffPolicy::Exponential { base_ms: 1000 };

    #[test]
    fn test_exponential_first_retry_uses_base_delay() {
        let now = SystemTime::now();
        let at = next_retry_at(Some(&BASE), 1, 3, now).expect("scheduled");
        assert_eq!(at, now + Duration::from_millis(1000));
    }

    #[test]
    fn test_exponential_doubles_per_prior_attempt() {
        let now = SystemTime::now();
        let at = next_retry_at(Some(&BASE), 2, 3, now).expect("scheduled");
        assert_eq!(at, now + Duration::from_millis(2000));
    }

    #[test]
    fn test_exhausted_attempts_yield_no_retry() {
        let now = SystemTime::now();
        assert_eq!(next_retry_at(Some(&BASE), 3, 3, now), None);
        assert_eq!(next_retry_at(Some(&BASE), 4, 3, now), None);
    }

    #[test]
    fn test_zero_attempts_made_uses_base_delay() {
        // The queue reports failures with attempts_made >= 1, but 0 must not
        // underflow the exponent.
        let now = SystemTime::now();
        let at = next_retry_at(Some(&BASE), 0, 3, now).expect("scheduled");
        assert_eq!(at, now + Duration::from_millis(1000));
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let now = SystemTime::now();
        let policy = BackoffPolicy::Fixed(250);
        for attempts_made in 1..5 {
            let at = next_retry_at(Some(&policy), attempts_made, 10, now).expect("scheduled");
            assert_eq!(at, now + Duration::from_millis(250));
        }
    }

    #[test]
    fn test_absent_policy_is_terminal() {
        assert_eq!(next_retry_at(None, 1, 3, SystemTime::now()), None);
    }

    #[test]
    fn test_huge_attempt_count_saturates() {
        let policy = BackoffPolicy::Exponential { base_ms: 1000 };
        assert_eq!(
            policy.delay_for(u32::MAX),
            Duration::from_millis(u64::MAX)
        );
    }

    #[test]
    fn test_serde_shapes() {
        let fixed: BackoffPolicy = serde_json::from_str("5000").expect("fixed");
        assert_eq!(fixed, BackoffPolicy::Fixed(5000));

        let exp: BackoffPolicy = serde_json::from_str(r#"{"base_ms":1000}"#).expect("exponential");
        assert_eq!(exp, BackoffPolicy::Exponential { base_ms: 1000 });

        assert_eq!(serde_json::to_string(&fixed).expect("json"), "5000");
    }
}
