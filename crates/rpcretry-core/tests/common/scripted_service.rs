//! In-process fake service that replays a script of responses, one step per call.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rpcretry_core::{CallContext, ErrorCode, Outcome, Pushback};

pub const UNAVAILABLE: i32 = 14;
pub const DEADLINE_EXCEEDED: i32 = 4;
pub const INVALID_ARGUMENT: i32 = 3;

/// Error returned by the fake service: a status code plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: i32,
    pub message: String,
}

impl Status {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

impl std::error::Error for Status {}

impl ErrorCode for Status {
    fn code(&self) -> Option<i32> {
        Some(self.code)
    }
}

#[derive(Debug, Clone)]
pub enum Step {
    Reply(String, Option<Pushback>),
    Fail(Status, Option<Pushback>),
    /// Sleep without looking at the context, then reply.
    Straggle(Duration, String),
    /// Block until the attempt context is done, then fail with DEADLINE_EXCEEDED.
    WaitForDeadline,
}

impl Step {
    pub fn ok(body: &str) -> Self {
        Step::Reply(body.to_string(), None)
    }

    pub fn unavailable(message: &str) -> Self {
        Step::Fail(Status::new(UNAVAILABLE, message), None)
    }

    pub fn fail_with_pushback(message: &str, pushback: Pushback) -> Self {
        Step::Fail(Status::new(UNAVAILABLE, message), Some(pushback))
    }
}

/// Replays `steps` in order; once exhausted keeps failing with UNAVAILABLE.
#[derive(Debug, Default)]
pub struct ScriptedService {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicU32,
    seen: Mutex<Vec<SeenContext>>,
}

/// What an attempt observed about its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeenContext {
    pub attempt: u32,
    pub skip_visited_nodes: bool,
    pub had_deadline: bool,
}

impl ScriptedService {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenContext> {
        self.seen.lock().unwrap().clone()
    }

    pub async fn call(&self, ctx: CallContext, request: &str) -> Outcome<String, Status> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(SeenContext {
            attempt: ctx.attempt(),
            skip_visited_nodes: ctx.skip_visited_nodes(),
            had_deadline: ctx.deadline().is_some(),
        });
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(body, pushback)) => {
                Outcome::ok(format!("{request}:{body}")).with_pushback_opt(pushback)
            }
            Some(Step::Fail(status, pushback)) => Outcome::err(status).with_pushback_opt(pushback),
            Some(Step::Straggle(delay, body)) => {
                tokio::time::sleep(delay).await;
                Outcome::ok(format!("{request}:{body}"))
            }
            Some(Step::WaitForDeadline) => {
                ctx.done().await;
                Outcome::err(Status::new(DEADLINE_EXCEEDED, "attempt deadline"))
            }
            None => Outcome::err(Status::new(UNAVAILABLE, format!("fail {n}"))),
        }
    }
}
