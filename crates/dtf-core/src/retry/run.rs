//! Retry loop: run a closure until success or policy says stop.

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};
use crate::fetch::FetchError;

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, FetchError>
where
    F: FnMut() -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt,
                            delay_ms = d.as_millis() as u64,
                            "{}; retrying",
                            e
                        );
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn http(status: u32) -> FetchError {
        FetchError::Http {
            url: "http://127.0.0.1/x".into(),
            status,
        }
    }

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn default_policy_tries_once() {
        let mut calls = 0;
        let r: Result<(), _> = run_with_retry(&RetryPolicy::default(), || {
            calls += 1;
            Err(http(503))
        });
        assert!(r.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_transient_until_success() {
        let mut calls = 0;
        let r = run_with_retry(&fast(5), || {
            calls += 1;
            if calls < 3 {
                Err(http(503))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(r.unwrap(), 3);
    }

    #[test]
    fn does_not_retry_not_found() {
        let mut calls = 0;
        let r: Result<(), _> = run_with_retry(&fast(5), || {
            calls += 1;
            Err(http(404))
        });
        assert!(matches!(r, Err(FetchError::Http { status: 404, .. })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let r: Result<(), _> = run_with_retry(&fast(3), || {
            calls += 1;
            Err(http(500))
        });
        assert!(r.is_err());
        assert_eq!(calls, 3);
    }
}
