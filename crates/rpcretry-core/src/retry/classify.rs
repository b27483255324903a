//! Decide whether an attempt's error is worth another attempt.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Errors that expose a numeric status code (gRPC code, framework code, HTTP status).
pub trait ErrorCode {
    /// The code, or `None` when the error has no code to classify by.
    fn code(&self) -> Option<i32>;
}

pub(crate) type RetryablePredicate<E> = dyn Fn(&E) -> bool + Send + Sync;

/// Combination of a caller predicate and a fixed set of retryable codes.
/// An error is retryable when either source says so.
pub(crate) struct Classifier<E> {
    predicate: Option<Arc<RetryablePredicate<E>>>,
    codes: HashSet<i32>,
    code_of: Option<fn(&E) -> Option<i32>>,
}

impl<E> Classifier<E> {
    pub(crate) fn new(
        predicate: Option<Arc<RetryablePredicate<E>>>,
        codes: HashSet<i32>,
        code_of: Option<fn(&E) -> Option<i32>>,
    ) -> Self {
        Self {
            predicate,
            codes,
            code_of,
        }
    }

    pub(crate) fn is_configured(&self) -> bool {
        self.predicate.is_some() || (self.code_of.is_some() && !self.codes.is_empty())
    }

    pub(crate) fn is_retryable(&self, err: &E) -> bool {
        if let Some(predicate) = &self.predicate {
            if predicate(err) {
                return true;
            }
        }
        match self.code_of.and_then(|code_of| code_of(err)) {
            Some(code) => self.codes.contains(&code),
            None => false,
        }
    }
}

impl<E> Clone for Classifier<E> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            codes: self.codes.clone(),
            code_of: self.code_of,
        }
    }
}

impl<E> fmt::Debug for Classifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut codes: Vec<_> = self.codes.iter().copied().collect();
        codes.sort_unstable();
        f.debug_struct("Classifier")
            .field("predicate", &self.predicate.is_some())
            .field("codes", &codes)
            .finish()
    }
}
