//! Lock-free token bucket throttle.
//!
//! Successes add `ratio` tokens, retryable failures remove one. Further
//! retries are admitted only while the level stays strictly above the
//! threshold (half of capacity by default).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::ConfigError;

use super::Throttle;

/// Largest accepted bucket capacity.
pub const MAX_TOKENS_LIMIT: f64 = 1000.0;

/// Shared token bucket. The level is an `f64` stored as raw bits in an
/// `AtomicU64` and only ever changed by compare-and-swap, clamped to
/// `[0, max_tokens]`.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: AtomicU64,
    max_tokens: f64,
    threshold: f64,
    ratio: f64,
}

impl TokenBucket {
    /// Create a full bucket with capacity `max_tokens` gaining `ratio` tokens per success.
    pub fn new(max_tokens: f64, ratio: f64) -> Result<Self, ConfigError> {
        if !max_tokens.is_finite() || max_tokens <= 0.0 || max_tokens > MAX_TOKENS_LIMIT {
            return Err(ConfigError::InvalidMaxTokens {
                got: max_tokens,
                max: MAX_TOKENS_LIMIT,
            });
        }
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ConfigError::InvalidTokenRatio(ratio));
        }
        Ok(Self {
            tokens: AtomicU64::new(max_tokens.to_bits()),
            max_tokens,
            threshold: max_tokens / 2.0,
            ratio,
        })
    }

    /// Override the admission threshold (default `max_tokens / 2`).
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        if !threshold.is_finite() || threshold < 0.0 || threshold >= self.max_tokens {
            return Err(ConfigError::InvalidThreshold {
                got: threshold,
                max_tokens: self.max_tokens,
            });
        }
        self.threshold = threshold;
        Ok(self)
    }

    /// Current token level.
    pub fn tokens(&self) -> f64 {
        f64::from_bits(self.tokens.load(Ordering::Acquire))
    }

    pub fn max_tokens(&self) -> f64 {
        self.max_tokens
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Apply `step` to the level until the CAS succeeds. `step` returns `None`
    /// when the level is already saturated and nothing should be written.
    fn update(&self, step: impl Fn(f64) -> Option<f64>) {
        let mut current = self.tokens.load(Ordering::Acquire);
        loop {
            let Some(next) = step(f64::from_bits(current)) else {
                return;
            };
            match self.tokens.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Throttle for TokenBucket {
    fn allow(&self) -> bool {
        self.tokens() > self.threshold
    }

    fn on_success(&self) {
        let max = self.max_tokens;
        let ratio = self.ratio;
        self.update(|tokens| (tokens < max).then(|| (tokens + ratio).min(max)));
    }

    fn on_failure(&self) {
        self.update(|tokens| (tokens > 0.0).then(|| (tokens - 1.0).max(0.0)));
    }
}
