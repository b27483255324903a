use super::strategy::{Backoff, BackoffKind};

/// Collects the backoff strategies offered to a builder and resolves them once.
///
/// Offering a strategy never replaces one of strictly higher priority, so the
/// outcome does not depend on the order in which options were applied.
#[derive(Debug, Clone, Default)]
pub struct BackoffSlots {
    chosen: Option<Backoff>,
}

impl BackoffSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `candidate`. Returns `false` if it was ignored because a
    /// higher-priority strategy is already installed.
    pub fn offer(&mut self, candidate: Backoff) -> bool {
        match &self.chosen {
            Some(current) if current.kind() > candidate.kind() => {
                tracing::debug!(
                    installed = ?current.kind(),
                    ignored = ?candidate.kind(),
                    "lower-priority backoff ignored"
                );
                false
            }
            _ => {
                self.chosen = Some(candidate);
                true
            }
        }
    }

    pub fn kind(&self) -> BackoffKind {
        self.chosen
            .as_ref()
            .map(Backoff::kind)
            .unwrap_or(BackoffKind::None)
    }

    /// The winning strategy, or [`Backoff::none`] if nothing was offered.
    pub fn resolve(self) -> Backoff {
        self.chosen.unwrap_or_default()
    }
}
