use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::stat::Reporter;
use crate::throttle::Throttle;

use super::builder::RetryPolicyBuilder;
use super::classify::Classifier;

pub(crate) type ResponseToError<R, E> = dyn Fn(&R) -> Result<(), E> + Send + Sync;

/// Immutable retry configuration for calls returning `R` or failing with `E`.
///
/// Build once with [`RetryPolicy::builder`] and reuse for every call: each
/// `invoke` runs its own session with a private attempt log, only the
/// throttle is shared between sessions. Cloning is cheap.
pub struct RetryPolicy<R, E> {
    pub(super) max_attempts: u32,
    pub(super) backoff: Backoff,
    pub(super) throttle: Arc<dyn Throttle>,
    pub(super) classifier: Classifier<E>,
    pub(super) response_to_error: Option<Arc<ResponseToError<R, E>>>,
    pub(super) reporter: Arc<dyn Reporter>,
    pub(super) attempt_timeout: Option<Duration>,
    pub(super) skip_visited_nodes: bool,
}

impl<R, E> RetryPolicy<R, E> {
    pub fn builder() -> RetryPolicyBuilder<R, E> {
        RetryPolicyBuilder::new()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn throttle(&self) -> &Arc<dyn Throttle> {
        &self.throttle
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    pub fn skip_visited_nodes(&self) -> bool {
        self.skip_visited_nodes
    }

    pub fn is_retryable(&self, err: &E) -> bool {
        self.classifier.is_retryable(err)
    }

    /// Surface a business error hidden in a successful response, if configured.
    pub(super) fn check_response(&self, response: &R) -> Result<(), E> {
        match &self.response_to_error {
            Some(f) => f(response),
            None => Ok(()),
        }
    }
}

impl<R, E> Clone for RetryPolicy<R, E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            backoff: self.backoff.clone(),
            throttle: Arc::clone(&self.throttle),
            classifier: self.classifier.clone(),
            response_to_error: self.response_to_error.clone(),
            reporter: Arc::clone(&self.reporter),
            attempt_timeout: self.attempt_timeout,
            skip_visited_nodes: self.skip_visited_nodes,
        }
    }
}

impl<R, E> fmt::Debug for RetryPolicy<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .field("throttle", &self.throttle)
            .field("classifier", &self.classifier)
            .field("response_to_error", &self.response_to_error.is_some())
            .field("attempt_timeout", &self.attempt_timeout)
            .field("skip_visited_nodes", &self.skip_visited_nodes)
            .finish()
    }
}
