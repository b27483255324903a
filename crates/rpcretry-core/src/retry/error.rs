//! Error returned by `RetryPolicy::invoke`.

use std::fmt;

/// Terminal failure of a logical call.
///
/// Every failure except cancellation carries the last attempt's error value
/// untouched; cancellation always reports [`CallError::Timeout`], whatever the
/// last attempt returned.
#[derive(Debug)]
pub enum CallError<E> {
    /// The call context was cancelled or its deadline passed.
    Timeout,
    /// Error of the last attempt that ran.
    Attempt(E),
}

impl<E> CallError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallError::Timeout)
    }

    pub fn attempt_error(&self) -> Option<&E> {
        match self {
            CallError::Attempt(e) => Some(e),
            CallError::Timeout => None,
        }
    }

    /// Recover the original error, `None` for a timeout.
    pub fn into_attempt_error(self) -> Option<E> {
        match self {
            CallError::Attempt(e) => Some(e),
            CallError::Timeout => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Timeout => write!(f, "call timed out"),
            CallError::Attempt(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for CallError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Attempt(e) => e.source(),
            CallError::Timeout => None,
        }
    }
}
