//! Retry orchestration.
//!
//! A [`RetryPolicy`] bundles backoff, a shared throttle, error classification
//! and the attempt budget. `invoke` runs one logical call as a sequence of
//! attempts, strictly one after another: a retry starts only after the
//! previous attempt returned, never concurrently with it.
//!
//! Terminal conditions, in precedence order: call context done, success,
//! non-retryable error, server pushback forbidding retries, attempt budget
//! exhausted, throttle denial recorded when the attempt was created.

mod builder;
mod classify;
mod error;
mod policy;
mod run;

pub use builder::{RetryPolicyBuilder, DEFAULT_MAX_ATTEMPTS, MAX_ATTEMPTS_CAP};
pub use classify::ErrorCode;
pub use error::CallError;
pub use policy::RetryPolicy;
