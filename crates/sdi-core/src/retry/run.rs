//! Retry loop: run a closure until success or the policy says stop.

use super::policy::{LinearBackoff, RetryDecision};
use std::time::Duration;

/// Runs `f` until it succeeds or the policy gives up, returning the last
/// error in that case. On a retryable failure, `sleep` is called with the
/// backoff delay before the next attempt.
///
/// `f` receives the 1-based attempt number for diagnostics. `sleep` is
/// injected so tests can record the delay sequence instead of blocking.
pub fn run_with_retry<T, E, F, S>(policy: &LinearBackoff, mut sleep: S, mut f: F) -> Result<T, E>
where
    F: FnMut(u32) -> Result<T, E>,
    S: FnMut(Duration),
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    sleep(d);
                    attempt += 1;
                }
            },
        }
    }
}
