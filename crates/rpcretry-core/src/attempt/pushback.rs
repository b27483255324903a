//! Server pushback: a hint returned with an attempt's response that overrides
//! local backoff or forbids further retries.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Conventional response metadata key carrying the pushback in milliseconds.
pub const PUSHBACK_METADATA_KEY: &str = "grpc-retry-pushback-ms";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pushback {
    /// Server forbids any further attempt for this call.
    Stop,
    /// Wait exactly this long before the next attempt, ignoring backoff.
    After(Duration),
}

impl Pushback {
    /// Signed millisecond hint: negative means stop.
    pub fn from_millis(ms: i64) -> Self {
        match u64::try_from(ms) {
            Ok(ms) => Pushback::After(Duration::from_millis(ms)),
            Err(_) => Pushback::Stop,
        }
    }

    /// Signed nanosecond hint: negative means stop.
    pub fn from_nanos(ns: i64) -> Self {
        match u64::try_from(ns) {
            Ok(ns) => Pushback::After(Duration::from_nanos(ns)),
            Err(_) => Pushback::Stop,
        }
    }

    /// Decode a metadata value such as `"250"`.
    ///
    /// Anything that is not a non-negative integer is read as [`Pushback::Stop`].
    pub fn parse_metadata(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(ms) => Self::from_millis(ms),
            Err(_) => {
                tracing::debug!(value, "malformed pushback metadata, treating as stop");
                Pushback::Stop
            }
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Pushback::Stop)
    }

    /// The delay to honour, `None` for [`Pushback::Stop`].
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Pushback::Stop => None,
            Pushback::After(d) => Some(*d),
        }
    }
}

impl fmt::Display for Pushback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pushback::Stop => write!(f, "stop"),
            Pushback::After(d) => write!(f, "{}ms", d.as_millis()),
        }
    }
}
