//! A single attempt of a logical call, its outcome, and server pushback.

mod outcome;
mod pushback;
mod record;

pub use outcome::Outcome;
pub use pushback::{Pushback, PUSHBACK_METADATA_KEY};
pub use record::{Attempt, AttemptState};
