//! Admission control for retries.
//!
//! A throttle is created once and shared (`Arc<dyn Throttle>`) by every policy
//! and invocation that should back off together, typically one per target
//! service. Policies never own it.

mod bucket;
mod noop;

pub use bucket::{TokenBucket, MAX_TOKENS_LIMIT};
pub use noop::NoopThrottle;

/// Adaptive gate consulted before every attempt and fed with attempt outcomes.
///
/// Implementations must be callable concurrently from many tasks without blocking.
pub trait Throttle: Send + Sync + std::fmt::Debug {
    /// Whether a new attempt may be followed by further retries.
    fn allow(&self) -> bool;

    /// An attempt completed without error.
    fn on_success(&self);

    /// An attempt failed with a retryable error.
    fn on_failure(&self);
}
