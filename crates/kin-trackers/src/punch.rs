//! Punch speed measurement.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use kin_core::{Clock, Platform, TimerId, Timers};
use kin_math::Vec3;

/// Tuning for punch measurement.
#[derive(Debug, Clone)]
pub struct PunchConfig {
    /// Linear acceleration magnitude that marks the fist in flight,
    /// m/s^2; the measurement completes when it falls back below.
    pub arm_threshold: f64,
    /// Give-up window for a measurement that never completes, ms.
    pub timeout_ms: f64,
}

impl Default for PunchConfig {
    fn default() -> Self {
        Self {
            arm_threshold: 3.0,
            timeout_ms: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Waiting,
    InFlight,
}

#[derive(Debug)]
struct PunchInner {
    phase: Phase,
    speed: f64,
    peak_speed: f64,
    last_timestamp: f64,
    timer: Option<TimerId>,
    timed_out: bool,
}

impl PunchInner {
    fn clear_measurement(&mut self) {
        self.phase = Phase::Idle;
        self.speed = 0.0;
        self.peak_speed = 0.0;
        self.last_timestamp = 0.0;
    }
}

/// Integrates linear acceleration into a punch speed estimate.
///
/// `start()` arms a measurement and a give-up timer; feeding readings
/// through [`PunchMeter::record`] integrates speed while the
/// acceleration magnitude stays above the arming threshold and reports
/// the peak speed once it drops back below. Every completion path,
/// including `stop()`, cancels the give-up timer, so a stale timeout
/// can never fire into the next measurement.
pub struct PunchMeter {
    config: PunchConfig,
    inner: Rc<RefCell<PunchInner>>,
    clock: Clock,
    timers: Timers,
}

impl PunchMeter {
    pub fn new(platform: &Platform) -> Self {
        Self::with_config(platform, PunchConfig::default())
    }

    pub fn with_config(platform: &Platform, config: PunchConfig) -> Self {
        Self {
            config,
            inner: Rc::new(RefCell::new(PunchInner {
                phase: Phase::Idle,
                speed: 0.0,
                peak_speed: 0.0,
                last_timestamp: 0.0,
                timer: None,
                timed_out: false,
            })),
            clock: platform.clock(),
            timers: platform.timers().clone(),
        }
    }

    /// Begins a fresh measurement; any previous one is discarded along
    /// with its timer and counters.
    pub fn start(&self) {
        self.cancel_timer();
        {
            let mut inner = self.inner.borrow_mut();
            inner.clear_measurement();
            inner.phase = Phase::Waiting;
            inner.timed_out = false;
        }
        let timer = {
            let inner = Rc::clone(&self.inner);
            self.timers
                .schedule(self.clock.now_ms() + self.config.timeout_ms, move || {
                    let mut inner = inner.borrow_mut();
                    inner.timer = None;
                    if inner.phase != Phase::Idle {
                        debug!("punch measurement timed out");
                        inner.clear_measurement();
                        inner.timed_out = true;
                    }
                })
        };
        self.inner.borrow_mut().timer = Some(timer);
    }

    /// Abandons the measurement without a result.
    pub fn stop(&self) {
        self.cancel_timer();
        self.inner.borrow_mut().clear_measurement();
    }

    /// Feeds one linear-acceleration reading; returns the peak speed
    /// in m/s when this reading completes the measurement.
    pub fn record(&self, linear: Vec3) -> Option<f64> {
        let magnitude = linear.magnitude();
        let now = self.clock.now_ms();
        let completed = {
            let mut inner = self.inner.borrow_mut();
            match inner.phase {
                Phase::Idle => None,
                Phase::Waiting => {
                    if magnitude > self.config.arm_threshold {
                        inner.phase = Phase::InFlight;
                        inner.speed = 0.0;
                        inner.peak_speed = 0.0;
                        inner.last_timestamp = now;
                    }
                    None
                }
                Phase::InFlight => {
                    let dt = ((now - inner.last_timestamp) / 1000.0).max(0.0);
                    inner.last_timestamp = now;
                    inner.speed += magnitude * dt;
                    inner.peak_speed = inner.peak_speed.max(inner.speed);
                    if magnitude < self.config.arm_threshold {
                        let peak = inner.peak_speed;
                        inner.clear_measurement();
                        Some(peak)
                    } else {
                        None
                    }
                }
            }
        };
        if let Some(peak) = completed {
            self.cancel_timer();
            debug!("punch complete: peak speed {peak:.2} m/s");
        }
        completed
    }

    /// True from `start()` until completion, timeout or `stop()`.
    pub fn is_measuring(&self) -> bool {
        self.inner.borrow().phase != Phase::Idle
    }

    /// True when the give-up timer ended the most recent measurement.
    pub fn timed_out(&self) -> bool {
        self.inner.borrow().timed_out
    }

    fn cancel_timer(&self) {
        let timer = self.inner.borrow_mut().timer.take();
        if let Some(timer) = timer {
            self.timers.cancel(timer);
        }
    }
}

impl std::fmt::Debug for PunchMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PunchMeter")
            .field("phase", &inner.phase)
            .field("peak_speed", &inner.peak_speed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kin_core::{ManualClock, PlatformConfig};

    fn rig() -> (ManualClock, Platform) {
        let clock = ManualClock::new();
        let platform = Platform::with_clock(PlatformConfig::default(), Rc::new(clock.clone()));
        (clock, platform)
    }

    #[test]
    fn a_punch_integrates_to_its_peak_speed() {
        let (clock, platform) = rig();
        let meter = PunchMeter::new(&platform);
        meter.start();
        assert!(meter.is_measuring());

        // fist takes off
        assert_eq!(meter.record(Vec3::new(10.0, 0.0, 0.0)), None);
        // ten 20 ms strides at 10 m/s^2 add 0.2 m/s each
        for step in 1..=10 {
            clock.set(step as f64 * 20.0);
            assert_eq!(meter.record(Vec3::new(10.0, 0.0, 0.0)), None);
        }
        // deceleration below the threshold completes the measurement
        clock.set(220.0);
        let peak = meter.record(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        assert!((peak - 2.0).abs() < 1e-9);
        assert!(!meter.is_measuring());
        // completion cancelled the give-up timer
        assert_eq!(platform.timers().pending(), 0);
    }

    #[test]
    fn readings_below_threshold_never_arm() {
        let (clock, platform) = rig();
        let meter = PunchMeter::new(&platform);
        meter.start();
        for step in 0..50 {
            clock.set(step as f64 * 20.0);
            assert_eq!(meter.record(Vec3::new(1.0, 0.0, 0.0)), None);
        }
        assert!(meter.is_measuring());
    }

    #[test]
    fn give_up_timer_ends_a_stalled_measurement() {
        let (clock, platform) = rig();
        let meter = PunchMeter::new(&platform);
        meter.start();
        clock.set(5000.0);
        platform.run_timers();
        assert!(!meter.is_measuring());
        assert!(meter.timed_out());
        // readings after the timeout are ignored
        assert_eq!(meter.record(Vec3::new(10.0, 0.0, 0.0)), None);
    }

    #[test]
    fn stop_cancels_the_timer_and_restart_is_fresh() {
        let (clock, platform) = rig();
        let meter = PunchMeter::new(&platform);
        meter.start();
        meter.record(Vec3::new(10.0, 0.0, 0.0));
        meter.stop();
        assert_eq!(platform.timers().pending(), 0);
        assert!(!meter.is_measuring());

        // a restarted measurement carries nothing over
        meter.start();
        assert!(!meter.timed_out());
        clock.set(10.0);
        meter.record(Vec3::new(10.0, 0.0, 0.0));
        clock.set(30.0);
        let peak = meter.record(Vec3::new(0.0, 0.0, 0.0)).unwrap();
        assert!((peak - 0.0).abs() < 1e-9);
    }

    #[test]
    fn restart_replaces_the_previous_timer() {
        let (clock, platform) = rig();
        let meter = PunchMeter::new(&platform);
        meter.start();
        clock.set(1000.0);
        meter.start();
        assert_eq!(platform.timers().pending(), 1);
        // the original deadline passes without ending the new measurement
        clock.set(5500.0);
        platform.run_timers();
        assert!(meter.is_measuring());
        clock.set(6000.0);
        platform.run_timers();
        assert!(!meter.is_measuring());
        assert!(meter.timed_out());
    }
}
