//! Monotonic time sources.
//!
//! Reading timestamps follow the `performance.now()` convention:
//! monotonic milliseconds since an arbitrary origin, as `f64`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait TimeSource {
    fn now_ms(&self) -> f64;
}

/// Shared handle to the platform's time source.
pub type Clock = Rc<dyn TimeSource>;

/// Wall-time backed monotonic source.
#[derive(Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-advanced source for tests and trace replay; clones share the
/// same notion of now.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: f64) {
        self.now.set(now_ms);
    }

    pub fn advance(&self, delta_ms: f64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl TimeSource for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_clock_never_goes_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn manual_clock_clones_share_now() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.set(100.0);
        handle.advance(50.0);
        assert_eq!(clock.now_ms(), 150.0);
    }
}
