//! Backoff strategies: attempt index -> delay before the next attempt.
//!
//! A [`Backoff`] is an immutable value; clone it freely and share it across
//! policies and tasks. When several strategies are offered to a policy
//! builder, [`BackoffSlots`] keeps the one with the highest [`BackoffKind`]
//! priority (customized > exponential > linear > none).

mod select;
mod strategy;

pub use select::BackoffSlots;
pub use strategy::{Backoff, BackoffKind};
