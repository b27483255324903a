use std::fmt;

use super::Stat;

/// Sink for finished-invocation summaries (metrics, logs).
pub trait Reporter: Send + Sync + fmt::Debug {
    fn report(&self, stat: &Stat);
}

/// Emits one `tracing` event per invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, stat: &Stat) {
        let cost_ms = stat.cost.as_secs_f64() * 1000.0;
        match &stat.error {
            None => tracing::debug!(
                attempts = stat.attempt_count(),
                throttled = stat.throttled,
                cost_ms,
                "call succeeded"
            ),
            Some(err) => tracing::info!(
                attempts = stat.attempt_count(),
                throttled = stat.throttled,
                frozen = stat.frozen,
                timed_out = stat.timed_out,
                cost_ms,
                error = %err,
                "call failed"
            ),
        }
    }
}
