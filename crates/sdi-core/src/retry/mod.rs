//! Retry and backoff policy for the release index query.
//!
//! The query is the only recoverable stage of the install: every failure
//! mode of an attempt (connection error, bad JSON, no matching release)
//! is treated as transient until the attempt budget runs out.

mod policy;
mod run;

pub use policy::{LinearBackoff, RetryDecision};
pub use run::run_with_retry;
