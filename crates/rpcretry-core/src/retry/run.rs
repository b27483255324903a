//! Retry loop: issue attempts one at a time until one succeeds or a terminal
//! condition holds.
//!
//! The loop runs on the caller's task. It suspends only while racing the call
//! context against the pending timer or against the running attempt, so a
//! cancelled call returns at once and drops whatever attempt was in flight.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::attempt::{Attempt, Outcome};
use crate::context::{instant_after, CallContext};
use crate::stat::{AttemptSummary, Stat};

use super::error::CallError;
use super::policy::RetryPolicy;

/// How a session ended.
enum Terminal<R, E> {
    Success(R),
    /// Error of the last attempt.
    Failed(E),
    TimedOut,
}

/// Per-invoke state. Owns its attempts; never outlives the call.
struct Session<'p, R, E> {
    policy: &'p RetryPolicy<R, E>,
    attempts: Vec<Attempt>,
    frozen: bool,
    throttled: bool,
}

impl<R, E: Display> RetryPolicy<R, E> {
    /// Run `perform` until it succeeds or the policy gives up.
    ///
    /// `perform` gets an isolated child of `ctx` per attempt and must honour
    /// it; it is called at most [`max_attempts`](Self::max_attempts) times.
    pub async fn invoke<'r, Req, F, Fut>(
        &self,
        ctx: &CallContext,
        request: &'r Req,
        perform: F,
    ) -> Result<R, CallError<E>>
    where
        Req: ?Sized,
        F: FnMut(CallContext, &'r Req) -> Fut,
        Fut: Future<Output = Outcome<R, E>>,
    {
        self.invoke_with_stat(ctx, request, perform).await.0
    }

    /// Like [`invoke`](Self::invoke), also returning the session summary
    /// that was handed to the reporter.
    pub async fn invoke_with_stat<'r, Req, F, Fut>(
        &self,
        ctx: &CallContext,
        request: &'r Req,
        perform: F,
    ) -> (Result<R, CallError<E>>, Stat)
    where
        Req: ?Sized,
        F: FnMut(CallContext, &'r Req) -> Fut,
        Fut: Future<Output = Outcome<R, E>>,
    {
        let started = Instant::now();
        let mut session = Session {
            policy: self,
            attempts: Vec::with_capacity(self.max_attempts as usize),
            frozen: false,
            throttled: false,
        };
        let terminal = session.run(ctx, request, perform).await;

        let result = match terminal {
            Terminal::Success(response) => Ok(response),
            Terminal::Failed(err) => Err(CallError::Attempt(err)),
            Terminal::TimedOut => Err(CallError::Timeout),
        };
        let stat = Stat {
            cost: started.elapsed(),
            attempts: session.attempts.iter().map(AttemptSummary::from).collect(),
            throttled: session.throttled,
            frozen: session.frozen,
            timed_out: matches!(result, Err(CallError::Timeout)),
            error: result.as_ref().err().map(ToString::to_string),
        };
        self.reporter.report(&stat);
        (result, stat)
    }
}

impl<'p, R, E: Display> Session<'p, R, E> {
    async fn run<'r, Req, F, Fut>(
        &mut self,
        ctx: &CallContext,
        request: &'r Req,
        mut perform: F,
    ) -> Terminal<R, E>
    where
        Req: ?Sized,
        F: FnMut(CallContext, &'r Req) -> Fut,
        Fut: Future<Output = Outcome<R, E>>,
    {
        let policy = self.policy;
        let timer = tokio::time::sleep(Duration::ZERO);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;
                _ = ctx.done() => return self.time_out(None),
                _ = &mut timer => {}
            }

            let index = self.attempts.len() as u32 + 1;
            if !self.throttled && !policy.throttle.allow() {
                self.throttled = true;
                tracing::debug!(attempt = index, "throttle denied admission, no retries after this attempt");
            }

            let mut attempt = Attempt::new(index);
            let attempt_ctx =
                ctx.for_attempt(index, policy.attempt_timeout, policy.skip_visited_nodes);
            attempt.begin();
            let outcome = tokio::select! {
                biased;
                _ = ctx.done() => None,
                outcome = perform(attempt_ctx.clone(), request) => Some(outcome),
            };
            let Some(Outcome { result, pushback }) = outcome else {
                attempt_ctx.cancel();
                return self.time_out(Some(attempt));
            };

            let checked = result.and_then(|response| {
                policy.check_response(&response).map(|()| response)
            });
            let retryable = checked
                .as_ref()
                .err()
                .is_some_and(|e| policy.is_retryable(e));
            let stop = pushback.is_some_and(|p| p.is_stop());

            match &checked {
                Ok(_) if !stop => policy.throttle.on_success(),
                Err(_) if retryable => policy.throttle.on_failure(),
                _ => {}
            }
            attempt.finish(checked.as_ref().err(), pushback);

            if ctx.is_done() {
                return self.time_out(Some(attempt));
            }
            let err = match checked {
                Ok(response) => {
                    self.attempts.push(attempt);
                    return Terminal::Success(response);
                }
                Err(err) => err,
            };
            if !retryable {
                tracing::debug!(attempt = index, error = %err, "error is not retryable");
                return self.give_up(attempt, err);
            }
            if stop {
                tracing::warn!(attempt = index, error = %err, "server pushback forbids further attempts");
                self.frozen = true;
                return self.give_up(attempt, err);
            }
            if index >= policy.max_attempts {
                tracing::info!(attempts = index, error = %err, "attempt budget exhausted");
                return self.give_up(attempt, err);
            }
            if self.throttled {
                tracing::info!(attempt = index, error = %err, "retry suppressed by throttle");
                return self.give_up(attempt, err);
            }

            let delay = match pushback.and_then(|p| p.delay()) {
                Some(delay) => delay,
                None => policy.backoff.next_delay(index),
            };
            tracing::debug!(
                attempt = index,
                delay_ms = delay.as_millis() as u64,
                pushback = ?pushback,
                "scheduling next attempt"
            );
            self.attempts.push(attempt);
            timer.as_mut().reset(instant_after(delay));
        }
    }

    fn give_up(&mut self, mut attempt: Attempt, err: E) -> Terminal<R, E> {
        attempt.mark_no_more_attempts();
        self.attempts.push(attempt);
        Terminal::Failed(err)
    }

    fn time_out(&mut self, attempt: Option<Attempt>) -> Terminal<R, E> {
        tracing::info!(attempts = self.attempts.len(), "call context done, abandoning retries");
        self.frozen = true;
        if let Some(mut attempt) = attempt {
            attempt.mark_no_more_attempts();
            self.attempts.push(attempt);
        }
        Terminal::TimedOut
    }
}
