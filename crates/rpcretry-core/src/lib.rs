//! Client-side retry policy engine.
//!
//! Decides, for one logical RPC call, whether and when to reissue it after a
//! failure, honouring a shared token-bucket [`throttle`], server
//! [`Pushback`](attempt::Pushback) hints and a hard attempt budget. Attempts
//! run strictly one after another; the transport itself is injected.

pub mod config;
pub mod logging;

pub mod attempt;
pub mod backoff;
pub mod context;
pub mod error;
pub mod retry;
pub mod stat;
pub mod throttle;

pub use attempt::{Outcome, Pushback};
pub use backoff::Backoff;
pub use context::CallContext;
pub use error::ConfigError;
pub use retry::{CallError, ErrorCode, RetryPolicy, RetryPolicyBuilder};
pub use stat::{Reporter, Stat};
pub use throttle::{NoopThrottle, Throttle, TokenBucket};
