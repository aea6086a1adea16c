use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decision returned by the backoff policy after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Give up; the caller surfaces the last error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Linear backoff: after failed attempt `n` (1-based), wait `n * unit`
/// before the next attempt.
///
/// The release query uses 5 attempts with a 5 second unit, so the delays
/// between attempts are 5, 10, 15 and 20 seconds, with no sleep after the
/// final attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinearBackoff {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay unit multiplied by the attempt number.
    pub unit: Duration,
}

impl Default for LinearBackoff {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            unit: Duration::from_secs(5),
        }
    }
}

impl LinearBackoff {
    /// Decide what to do after attempt `attempt` failed. `attempt` is
    /// 1-based (1 = first attempt).
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::NoRetry
        } else {
            RetryDecision::RetryAfter(self.unit.saturating_mul(attempt))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_are_linear() {
        let p = LinearBackoff::default();
        assert_eq!(
            p.decide(1),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(
            p.decide(2),
            RetryDecision::RetryAfter(Duration::from_secs(10))
        );
        assert_eq!(
            p.decide(3),
            RetryDecision::RetryAfter(Duration::from_secs(15))
        );
        assert_eq!(
            p.decide(4),
            RetryDecision::RetryAfter(Duration::from_secs(20))
        );
    }

    #[test]
    fn no_retry_after_final_attempt() {
        let p = LinearBackoff::default();
        assert_eq!(p.decide(5), RetryDecision::NoRetry);
        assert_eq!(p.decide(6), RetryDecision::NoRetry);
    }

    #[test]
    fn respects_custom_unit_and_attempts() {
        let p = LinearBackoff {
            max_attempts: 3,
            unit: Duration::from_millis(100),
        };
        assert_eq!(
            p.decide(2),
            RetryDecision::RetryAfter(Duration::from_millis(200))
        );
        assert_eq!(p.decide(3), RetryDecision::NoRetry);
    }
}
