//! Retry and backoff policy.
//!
//! Classifies chunk errors into the failure taxonomy and decides, per
//! attempt, whether to retry after an exponential backoff.

mod classify;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status};
pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
