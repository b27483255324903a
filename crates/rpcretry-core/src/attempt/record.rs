use std::fmt::Display;
use std::time::{Duration, SystemTime};

use tokio::time::Instant;

use super::Pushback;

/// Lifecycle of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Created,
    Running,
    Finished,
}

/// One try of the underlying call.
///
/// Built by the retry loop, filled in by the execution step, then appended to
/// the session log where it is only read. The error is kept rendered: the
/// error value itself travels back to the caller.
#[derive(Debug, Clone)]
pub struct Attempt {
    index: u32,
    state: AttemptState,
    start: Option<SystemTime>,
    end: Option<SystemTime>,
    started_at: Option<Instant>,
    elapsed: Duration,
    error: Option<String>,
    pushback: Option<Pushback>,
    no_more_attempts: bool,
}

impl Attempt {
    pub(crate) fn new(index: u32) -> Self {
        Self {
            index,
            state: AttemptState::Created,
            start: None,
            end: None,
            started_at: None,
            elapsed: Duration::ZERO,
            error: None,
            pushback: None,
            no_more_attempts: false,
        }
    }

    pub(crate) fn begin(&mut self) {
        debug_assert_eq!(self.state, AttemptState::Created);
        self.state = AttemptState::Running;
        self.start = Some(SystemTime::now());
        self.started_at = Some(Instant::now());
    }

    pub(crate) fn finish<E: Display>(&mut self, error: Option<&E>, pushback: Option<Pushback>) {
        debug_assert_eq!(self.state, AttemptState::Running);
        self.state = AttemptState::Finished;
        self.end = Some(SystemTime::now());
        self.elapsed = self
            .started_at
            .map(|at| at.elapsed())
            .unwrap_or_default();
        self.error = error.map(ToString::to_string);
        self.pushback = pushback;
    }

    /// Flag this attempt as the last one the session will ever issue.
    pub(crate) fn mark_no_more_attempts(&mut self) {
        self.no_more_attempts = true;
    }

    /// 1-based position in the session.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn state(&self) -> AttemptState {
        self.state
    }

    pub fn start(&self) -> Option<SystemTime> {
        self.start
    }

    pub fn end(&self) -> Option<SystemTime> {
        self.end
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pushback(&self) -> Option<Pushback> {
        self.pushback
    }

    pub fn no_more_attempts(&self) -> bool {
        self.no_more_attempts
    }

    pub fn succeeded(&self) -> bool {
        self.state == AttemptState::Finished && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_records_timing_and_outcome() {
        let mut a = Attempt::new(1);
        assert_eq!(a.state(), AttemptState::Created);
        assert!(a.start().is_none());

        a.begin();
        assert_eq!(a.state(), AttemptState::Running);
        assert!(!a.succeeded());

        a.finish(Some(&"unavailable"), Some(Pushback::Stop));
        assert_eq!(a.state(), AttemptState::Finished);
        assert!(a.start().unwrap() <= a.end().unwrap());
        assert_eq!(a.error(), Some("unavailable"));
        assert_eq!(a.pushback(), Some(Pushback::Stop));
        assert!(!a.succeeded());
    }

    #[test]
    fn success_without_error() {
        let mut a = Attempt::new(3);
        a.begin();
        a.finish(None::<&String>, None);
        assert!(a.succeeded());
        assert_eq!(a.index(), 3);
        assert!(!a.no_more_attempts());
        a.mark_no_more_attempts();
        assert!(a.no_more_attempts());
    }
}
