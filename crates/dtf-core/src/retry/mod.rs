//! Retry and backoff policy for fixture fetches.
//!
//! Fetches are attempted once by default. A policy with more attempts retries
//! only transient kinds (timeouts, throttling, connection failures, 5xx) with
//! capped exponential backoff; 404s and other client errors fail immediately.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
