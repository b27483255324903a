//! Option-style construction of a [`RetryPolicy`].
//!
//! Each setter validates eagerly; the first invalid option is remembered and
//! returned by [`RetryPolicyBuilder::build`], later errors are dropped.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::{Backoff, BackoffSlots};
use crate::error::ConfigError;
use crate::stat::{Reporter, TracingReporter};
use crate::throttle::{NoopThrottle, Throttle};

use super::classify::{Classifier, ErrorCode, RetryablePredicate};
use super::policy::{ResponseToError, RetryPolicy};

/// Hard ceiling on attempts per call, first attempt included.
pub const MAX_ATTEMPTS_CAP: u32 = 5;

/// Attempts per call when the builder is not told otherwise.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub struct RetryPolicyBuilder<R, E> {
    error: Option<ConfigError>,
    max_attempts: u32,
    backoff: BackoffSlots,
    throttle: Option<Arc<dyn Throttle>>,
    predicate: Option<Arc<RetryablePredicate<E>>>,
    codes: HashSet<i32>,
    code_of: Option<fn(&E) -> Option<i32>>,
    response_to_error: Option<Arc<ResponseToError<R, E>>>,
    reporter: Option<Arc<dyn Reporter>>,
    attempt_timeout: Option<Duration>,
    skip_visited_nodes: bool,
}

impl<R, E> Default for RetryPolicyBuilder<R, E> {
    fn default() -> Self {
        Self {
            error: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: BackoffSlots::new(),
            throttle: None,
            predicate: None,
            codes: HashSet::new(),
            code_of: None,
            response_to_error: None,
            reporter: None,
            attempt_timeout: None,
            skip_visited_nodes: false,
        }
    }
}

impl<R, E> std::fmt::Debug for RetryPolicyBuilder<R, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicyBuilder")
            .field("error", &self.error)
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff.kind())
            .field("codes", &self.codes)
            .field("predicate", &self.predicate.is_some())
            .finish_non_exhaustive()
    }
}

impl<R, E> RetryPolicyBuilder<R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, err: ConfigError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn offer_backoff(mut self, backoff: Result<Backoff, ConfigError>) -> Self {
        match backoff {
            Ok(b) => {
                self.backoff.offer(b);
            }
            Err(e) => self.fail(e),
        }
        self
    }

    /// Attempts per call including the first. Values above [`MAX_ATTEMPTS_CAP`] are clamped.
    pub fn max_attempts(mut self, n: u32) -> Self {
        if n == 0 {
            self.fail(ConfigError::ZeroMaxAttempts);
            return self;
        }
        if n > MAX_ATTEMPTS_CAP {
            tracing::debug!(requested = n, cap = MAX_ATTEMPTS_CAP, "max_attempts clamped");
        }
        self.max_attempts = n.min(MAX_ATTEMPTS_CAP);
        self
    }

    /// Install an already-built backoff, subject to kind priority.
    pub fn backoff(self, backoff: Backoff) -> Self {
        self.offer_backoff(Ok(backoff))
    }

    pub fn linear_backoff<I>(self, delays: I) -> Self
    where
        I: IntoIterator<Item = Duration>,
    {
        self.offer_backoff(Backoff::linear(delays))
    }

    pub fn exponential_backoff(self, initial: Duration, maximum: Duration, multiplier: f64) -> Self {
        self.offer_backoff(Backoff::exponential(initial, maximum, multiplier))
    }

    pub fn customized_backoff<F>(self, f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        self.offer_backoff(Ok(Backoff::customized(f)))
    }

    /// Errors for which `predicate` returns true are retried.
    pub fn retryable<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Shared throttle consulted before each attempt. Without one, retries are unthrottled.
    pub fn throttle(mut self, throttle: Arc<dyn Throttle>) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Turn a transport-level success into a business error (e.g. an embedded status).
    pub fn response_to_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&R) -> Result<(), E> + Send + Sync + 'static,
    {
        self.response_to_error = Some(Arc::new(f));
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Deadline given to each attempt's context, never past the call's own deadline.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Ask node selection to avoid targets already used by earlier attempts.
    /// Passed through to each attempt's context; the policy itself does not act on it.
    pub fn skip_visited_nodes(mut self, skip: bool) -> Self {
        self.skip_visited_nodes = skip;
        self
    }

    pub fn build(self) -> Result<RetryPolicy<R, E>, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let classifier = Classifier::new(self.predicate, self.codes, self.code_of);
        if !classifier.is_configured() {
            return Err(ConfigError::NoRetryableClassifier);
        }
        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: self.backoff.resolve(),
            throttle: self.throttle.unwrap_or_else(|| Arc::new(NoopThrottle)),
            classifier,
            response_to_error: self.response_to_error,
            reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
            attempt_timeout: self.attempt_timeout,
            skip_visited_nodes: self.skip_visited_nodes,
        })
    }
}

impl<R, E: ErrorCode> RetryPolicyBuilder<R, E> {
    /// Errors whose [`ErrorCode::code`] is in `codes` are retried.
    pub fn retryable_codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = i32>,
    {
        self.codes.extend(codes);
        self.code_of = Some(E::code as fn(&E) -> Option<i32>);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backoff::BackoffKind;

    #[derive(Debug)]
    struct Code(i32);

    impl ErrorCode for Code {
        fn code(&self) -> Option<i32> {
            Some(self.0)
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn requires_a_classifier() {
        let err = RetryPolicyBuilder::<(), Code>::new().build().unwrap_err();
        assert_eq!(err, ConfigError::NoRetryableClassifier);
        let err = RetryPolicyBuilder::<(), Code>::new()
            .retryable_codes([])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoRetryableClassifier);
    }

    #[test]
    fn max_attempts_is_clamped_to_cap() {
        let p = RetryPolicyBuilder::<(), Code>::new()
            .retryable_codes([14])
            .max_attempts(50)
            .build()
            .unwrap();
        assert_eq!(p.max_attempts(), MAX_ATTEMPTS_CAP);
    }

    #[test]
    fn first_error_wins() {
        let err = RetryPolicyBuilder::<(), Code>::new()
            .linear_backoff(Vec::new())
            .max_attempts(0)
            .exponential_backoff(Duration::ZERO, ms(1), 2.0)
            .retryable(|_| true)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::EmptyLinearBackoff);
    }

    #[test]
    fn backoff_priority_is_order_independent() {
        let p = RetryPolicyBuilder::<(), Code>::new()
            .retryable(|_| true)
            .customized_backoff(|_| ms(3))
            .exponential_backoff(ms(10), ms(100), 2.0)
            .linear_backoff([ms(5)])
            .build()
            .unwrap();
        assert_eq!(p.backoff().kind(), BackoffKind::Customized);

        let p = RetryPolicyBuilder::<(), Code>::new()
            .retryable(|_| true)
            .linear_backoff([ms(5)])
            .exponential_backoff(ms(10), ms(100), 2.0)
            .linear_backoff([ms(7)])
            .build()
            .unwrap();
        assert_eq!(p.backoff().kind(), BackoffKind::Exponential);
    }

    #[test]
    fn defaults() {
        let p = RetryPolicyBuilder::<(), Code>::new()
            .retryable(|_| false)
            .build()
            .unwrap();
        assert_eq!(p.max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert_eq!(p.backoff().kind(), BackoffKind::None);
        assert!(!p.skip_visited_nodes());
    }
}
