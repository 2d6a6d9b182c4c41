//! Retry policy for verification attempts.
//!
//! Every failed attempt (checksum mismatch, transfer failure, manifest
//! failure) is retried the same way: after a fixed delay, until the attempt
//! budget is spent. Failures are classified only so log lines say what went
//! wrong.

mod classify;
mod policy;

pub use classify::{classify_curl_error, classify_http_status, classify_transfer};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
