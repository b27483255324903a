//! Construction-time configuration errors shared by every component.

use std::time::Duration;

use thiserror::Error;

/// Invalid configuration rejected while building a backoff, throttle or policy.
///
/// Construction is eager: the first invalid option aborts the build and is
/// returned as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("linear backoff needs at least one delay")]
    EmptyLinearBackoff,

    #[error("exponential backoff initial delay must be > 0")]
    ZeroInitialBackoff,

    #[error("exponential backoff maximum {maximum:?} is below initial {initial:?}")]
    MaximumBelowInitial { initial: Duration, maximum: Duration },

    #[error("exponential backoff multiplier must be a finite value > 0, got {0}")]
    InvalidMultiplier(f64),

    #[error("throttle max_tokens must be in (0, {max}], got {got}")]
    InvalidMaxTokens { got: f64, max: f64 },

    #[error("throttle token ratio must be a finite value > 0, got {0}")]
    InvalidTokenRatio(f64),

    #[error("throttle threshold must be in [0, {max_tokens}), got {got}")]
    InvalidThreshold { got: f64, max_tokens: f64 },

    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("no retryable predicate or retryable error codes configured")]
    NoRetryableClassifier,
}
