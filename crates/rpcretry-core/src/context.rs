//! Call context: cancellation plus an optional deadline.
//!
//! The caller hands a [`CallContext`] to `RetryPolicy::invoke`; each attempt
//! receives its own child context, so cancelling or timing out one attempt
//! never leaks into the parent or into later attempts, while cancelling the
//! parent reaches every attempt.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Roughly 30 years: stands in for deadlines that would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + delay`, saturating to a far-future instant instead of overflowing.
pub(crate) fn instant_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Debug, Clone)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
    attempt: u32,
    skip_visited_nodes: bool,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CallContext {
    /// A context with no deadline that is never done until cancelled.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
            attempt: 0,
            skip_visited_nodes: false,
        }
    }

    /// Tighten the deadline to `now + timeout`. A later deadline never loosens an earlier one.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(instant_after(timeout))
    }

    pub fn with_deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(at),
            None => at,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// 1-based index of the attempt this context was issued for; 0 for a caller context.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether the node-selection layer should avoid targets already tried in this call.
    pub fn skip_visited_nodes(&self) -> bool {
        self.skip_visited_nodes
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_done(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(at) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Isolated context for one attempt: child cancellation, inherited deadline
    /// optionally tightened by `attempt_timeout`.
    pub(crate) fn for_attempt(
        &self,
        index: u32,
        attempt_timeout: Option<Duration>,
        skip_visited_nodes: bool,
    ) -> Self {
        let child = Self {
            token: self.token.child_token(),
            deadline: self.deadline,
            attempt: index,
            skip_visited_nodes,
        };
        match attempt_timeout {
            Some(timeout) => child.with_timeout(timeout),
            None => child,
        }
    }
}
