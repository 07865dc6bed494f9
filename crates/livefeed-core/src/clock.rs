//! Wall-clock sources
//!
//! Session timestamps are computed from local receipt time in seconds.
//! The clock is injected so tests (and deterministic consumers) can drive
//! time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A source of local wall-clock time in seconds since the UNIX epoch
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Real wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }
}

/// Manually driven clock
///
/// Clones share the same underlying time, so a test can keep one clone and
/// hand the other to a source.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_secs: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_secs.to_bits())),
        }
    }

    pub fn set(&self, secs: f64) {
        self.bits.store(secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, secs: f64) {
        self.set(self.now_secs() + secs);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
