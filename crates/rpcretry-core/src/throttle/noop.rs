use super::Throttle;

/// Throttle that always admits and ignores feedback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopThrottle;

impl Throttle for NoopThrottle {
    fn allow(&self) -> bool {
        true
    }

    fn on_success(&self) {}

    fn on_failure(&self) {}
}
