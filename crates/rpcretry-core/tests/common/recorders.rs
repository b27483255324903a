//! Test doubles for the throttle and reporter seams.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use rpcretry_core::{Reporter, Stat, Throttle};

/// Throttle with a fixed admission answer that counts feedback.
#[derive(Debug)]
pub struct CountingThrottle {
    allow: AtomicBool,
    pub allow_checks: AtomicU32,
    pub successes: AtomicU32,
    pub failures: AtomicU32,
}

impl CountingThrottle {
    pub fn new(allow: bool) -> Self {
        Self {
            allow: AtomicBool::new(allow),
            allow_checks: AtomicU32::new(0),
            successes: AtomicU32::new(0),
            failures: AtomicU32::new(0),
        }
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }
}

impl Throttle for CountingThrottle {
    fn allow(&self) -> bool {
        self.allow_checks.fetch_add(1, Ordering::SeqCst);
        self.allow.load(Ordering::SeqCst)
    }

    fn on_success(&self) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }
}

/// Keeps every reported stat.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    stats: Mutex<Vec<Stat>>,
}

impl RecordingReporter {
    pub fn stats(&self) -> Vec<Stat> {
        self.stats.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, stat: &Stat) {
        self.stats.lock().unwrap().push(stat.clone());
    }
}
