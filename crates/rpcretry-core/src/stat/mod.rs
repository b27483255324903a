//! Read-only summary of a finished invocation, for metrics and logging.
//!
//! The retry loop builds one [`Stat`] per `invoke` and hands it to the
//! configured [`Reporter`]; consumers never feed anything back.

mod reporter;

use std::time::{Duration, SystemTime};

use serde::Serialize;

use crate::attempt::{Attempt, Pushback};

pub use reporter::{Reporter, TracingReporter};

/// Per-attempt view inside a [`Stat`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub index: u32,
    pub start: Option<SystemTime>,
    pub end: Option<SystemTime>,
    pub elapsed: Duration,
    /// Rendered error of the attempt, `None` on success.
    pub error: Option<String>,
    pub pushback: Option<Pushback>,
    /// Set on the attempt after which the session refused to schedule more.
    pub no_more_attempts: bool,
}

impl From<&Attempt> for AttemptSummary {
    fn from(attempt: &Attempt) -> Self {
        Self {
            index: attempt.index(),
            start: attempt.start(),
            end: attempt.end(),
            elapsed: attempt.elapsed(),
            error: attempt.error().map(str::to_owned),
            pushback: attempt.pushback(),
            no_more_attempts: attempt.no_more_attempts(),
        }
    }
}

/// Summary of one `invoke`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    /// Wall time from the start of `invoke` until it returned.
    pub cost: Duration,
    pub attempts: Vec<AttemptSummary>,
    /// The throttle refused admission at some point, capping further attempts.
    pub throttled: bool,
    /// The session stopped because the server forbade retries or the call context ended.
    pub frozen: bool,
    /// The call context was cancelled or hit its deadline.
    pub timed_out: bool,
    /// Rendered error returned to the caller, `None` on success.
    pub error: Option<String>,
}

impl Stat {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Number of attempts beyond the first.
    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }
}
