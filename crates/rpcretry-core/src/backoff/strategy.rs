use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

/// Signature of a user-supplied delay function. Receives the 1-based attempt index.
pub type DelayFn = dyn Fn(u32) -> Duration + Send + Sync;

/// Which strategy a [`Backoff`] uses.
///
/// Variants are declared in ascending priority, so `Ord` doubles as the
/// precedence rule used when a builder is offered more than one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BackoffKind {
    None,
    Linear,
    Exponential,
    Customized,
}

#[derive(Clone)]
enum Strategy {
    None,
    Linear(Arc<[Duration]>),
    Exponential {
        initial: Duration,
        maximum: Duration,
        multiplier: f64,
    },
    Customized(Arc<DelayFn>),
}

/// Delay policy between attempts.
///
/// Only constructible through the validating constructors below, so a
/// `Backoff` value is always well-formed.
#[derive(Clone)]
pub struct Backoff {
    strategy: Strategy,
}

impl Backoff {
    /// No wait between attempts.
    pub fn none() -> Self {
        Self {
            strategy: Strategy::None,
        }
    }

    /// Fixed per-attempt delays, each randomized within `[0, delay)`.
    ///
    /// Attempt `n` uses `delays[n - 1]`; attempts past the end reuse the last entry.
    pub fn linear<I>(delays: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Duration>,
    {
        let delays: Arc<[Duration]> = delays.into_iter().collect();
        if delays.is_empty() {
            return Err(ConfigError::EmptyLinearBackoff);
        }
        Ok(Self {
            strategy: Strategy::Linear(delays),
        })
    }

    /// Full-jitter exponential backoff:
    /// `random(0, 1) * min(initial * multiplier^(attempt - 1), maximum)`.
    pub fn exponential(
        initial: Duration,
        maximum: Duration,
        multiplier: f64,
    ) -> Result<Self, ConfigError> {
        if initial.is_zero() {
            return Err(ConfigError::ZeroInitialBackoff);
        }
        if maximum < initial {
            return Err(ConfigError::MaximumBelowInitial { initial, maximum });
        }
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return Err(ConfigError::InvalidMultiplier(multiplier));
        }
        Ok(Self {
            strategy: Strategy::Exponential {
                initial,
                maximum,
                multiplier,
            },
        })
    }

    /// Delegate every decision to `f`. The result is used verbatim, without jitter.
    pub fn customized<F>(f: F) -> Self
    where
        F: Fn(u32) -> Duration + Send + Sync + 'static,
    {
        Self {
            strategy: Strategy::Customized(Arc::new(f)),
        }
    }

    pub fn kind(&self) -> BackoffKind {
        match self.strategy {
            Strategy::None => BackoffKind::None,
            Strategy::Linear(_) => BackoffKind::Linear,
            Strategy::Exponential { .. } => BackoffKind::Exponential,
            Strategy::Customized(_) => BackoffKind::Customized,
        }
    }

    /// Delay to wait after attempt `attempt` (1-based) before issuing the next one.
    ///
    /// `attempt == 0` always yields zero.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.next_delay_with(&mut rand::thread_rng(), attempt)
    }

    /// Same as [`next_delay`](Self::next_delay) with an explicit random source.
    pub fn next_delay_with<R: Rng + ?Sized>(&self, rng: &mut R, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        match &self.strategy {
            Strategy::None => Duration::ZERO,
            Strategy::Linear(delays) => {
                let idx = (attempt as usize - 1).min(delays.len() - 1);
                jitter(rng, delays[idx])
            }
            Strategy::Exponential {
                initial,
                maximum,
                multiplier,
            } => {
                let exp = i32::try_from(attempt - 1).unwrap_or(i32::MAX);
                let raw = initial.as_secs_f64() * multiplier.powi(exp);
                let ceiling = if raw.is_finite() && raw < maximum.as_secs_f64() {
                    Duration::from_secs_f64(raw)
                } else {
                    *maximum
                };
                jitter(rng, ceiling)
            }
            Strategy::Customized(f) => f(attempt),
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Backoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            Strategy::None => f.write_str("Backoff::None"),
            Strategy::Linear(delays) => f.debug_tuple("Backoff::Linear").field(delays).finish(),
            Strategy::Exponential {
                initial,
                maximum,
                multiplier,
            } => f
                .debug_struct("Backoff::Exponential")
                .field("initial", initial)
                .field("maximum", maximum)
                .field("multiplier", multiplier)
                .finish(),
            Strategy::Customized(_) => f.write_str("Backoff::Customized(..)"),
        }
    }
}

/// Uniform pick in `[0, ceiling)`; zero stays zero.
fn jitter<R: Rng + ?Sized>(rng: &mut R, ceiling: Duration) -> Duration {
    let nanos = u64::try_from(ceiling.as_nanos()).unwrap_or(u64::MAX);
    if nanos == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(rng.gen_range(0..nanos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn none_is_always_zero() {
        let b = Backoff::none();
        for attempt in 0..10 {
            assert_eq!(b.next_delay(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn attempt_zero_is_immediate_for_every_kind() {
        let exp = Backoff::exponential(ms(10), ms(100), 2.0).unwrap();
        let lin = Backoff::linear([ms(50)]).unwrap();
        let custom = Backoff::customized(|_| ms(7));
        assert_eq!(exp.next_delay(0), Duration::ZERO);
        assert_eq!(lin.next_delay(0), Duration::ZERO);
        assert_eq!(custom.next_delay(0), Duration::ZERO);
    }

    #[test]
    fn exponential_stays_under_growing_ceiling() {
        let b = Backoff::exponential(ms(10), Duration::from_secs(1), 2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(b.next_delay_with(&mut rng, 1) < ms(10));
            assert!(b.next_delay_with(&mut rng, 3) < ms(40));
        }
    }

    #[test]
    fn exponential_is_capped_at_maximum() {
        let b = Backoff::exponential(ms(10), ms(50), 10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        for attempt in [4, 30, u32::MAX] {
            assert!(b.next_delay_with(&mut rng, attempt) < ms(50));
        }
    }

    #[test]
    fn linear_clamps_to_last_entry() {
        let b = Backoff::linear([ms(1), ms(2), ms(30)]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut max_seen = Duration::ZERO;
        for _ in 0..200 {
            let d = b.next_delay_with(&mut rng, 9);
            assert!(d < ms(30));
            max_seen = max_seen.max(d);
        }
        // 200 draws in [0, 30ms) land above the 2ms entry.
        assert!(max_seen > ms(2));
        assert!(b.next_delay_with(&mut rng, 1) < ms(1));
    }

    #[test]
    fn linear_zero_delay_entry_is_immediate() {
        let b = Backoff::linear([Duration::ZERO]).unwrap();
        assert_eq!(b.next_delay(1), Duration::ZERO);
    }

    #[test]
    fn customized_result_is_used_verbatim() {
        let b = Backoff::customized(|attempt| ms(u64::from(attempt) * 100));
        assert_eq!(b.next_delay(1), ms(100));
        assert_eq!(b.next_delay(4), ms(400));
        assert_eq!(b.kind(), BackoffKind::Customized);
    }

    #[test]
    fn constructors_reject_invalid_input() {
        assert_eq!(
            Backoff::linear(Vec::new()).unwrap_err(),
            ConfigError::EmptyLinearBackoff
        );
        assert_eq!(
            Backoff::exponential(Duration::ZERO, ms(1), 2.0).unwrap_err(),
            ConfigError::ZeroInitialBackoff
        );
        assert!(matches!(
            Backoff::exponential(ms(10), ms(5), 2.0),
            Err(ConfigError::MaximumBelowInitial { .. })
        ));
        assert!(matches!(
            Backoff::exponential(ms(10), ms(50), 0.0),
            Err(ConfigError::InvalidMultiplier(_))
        ));
        assert!(matches!(
            Backoff::exponential(ms(10), ms(50), f64::NAN),
            Err(ConfigError::InvalidMultiplier(_))
        ));
    }

    #[test]
    fn kinds_are_ordered_by_priority() {
        assert!(BackoffKind::Customized > BackoffKind::Exponential);
        assert!(BackoffKind::Exponential > BackoffKind::Linear);
        assert!(BackoffKind::Linear > BackoffKind::None);
    }
}
