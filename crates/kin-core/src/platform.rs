//! Platform context.
//!
//! The explicit context a consuming application owns instead of a bag
//! of globals: host capabilities resolved into a backend registry, the
//! permission table, the device event hub, a clock, the timer queue
//! and the current screen-orientation angle.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::device::{DeviceMotionEvent, DeviceOrientationEvent};
use crate::error::SensorError;
use crate::hub::{DeviceEventHub, NativeReading};
use crate::permissions::{PermissionState, Permissions};
use crate::registry::{Backend, Capabilities, SensorKind, SensorRegistry};
use crate::timers::{TimerId, Timers};

/// Shared handle to the screen-orientation angle, degrees clockwise.
#[derive(Debug, Clone, Default)]
pub struct ScreenAngle {
    degrees: Rc<Cell<f64>>,
}

impl ScreenAngle {
    pub fn degrees(&self) -> f64 {
        self.degrees.get()
    }

    pub fn radians(&self) -> f64 {
        self.degrees.get().to_radians()
    }

    pub fn set_degrees(&self, degrees: f64) {
        self.degrees.set(degrees);
    }
}

/// Host description handed to [`Platform::new`].
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub capabilities: Capabilities,
    /// Whether the engine runs in a top-level browsing context; sensor
    /// construction is refused anywhere else.
    pub top_level_context: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::full_legacy(),
            top_level_context: true,
        }
    }
}

/// The engine context sensors are constructed against.
pub struct Platform {
    hub: DeviceEventHub,
    registry: SensorRegistry,
    permissions: Permissions,
    clock: Clock,
    timers: Timers,
    screen_angle: ScreenAngle,
    top_level_context: bool,
}

impl Platform {
    /// Resolves capabilities once and fixes every kind's backend for
    /// the lifetime of the platform.
    pub fn new(config: PlatformConfig) -> Self {
        Self::with_clock(config, Rc::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: PlatformConfig, clock: Clock) -> Self {
        let registry = SensorRegistry::resolve(&config.capabilities);
        debug!(
            "platform ready (top-level: {})",
            config.top_level_context
        );
        Self {
            hub: DeviceEventHub::new(),
            registry,
            permissions: Permissions::new(),
            clock,
            timers: Timers::new(),
            screen_angle: ScreenAngle::default(),
            top_level_context: config.top_level_context,
        }
    }

    pub fn hub(&self) -> &DeviceEventHub {
        &self.hub
    }

    pub fn clock(&self) -> Clock {
        self.clock.clone()
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn backend(&self, kind: SensorKind) -> Backend {
        self.registry.backend(kind)
    }

    pub fn request_permission(&self, kind: SensorKind) -> PermissionState {
        self.permissions.request(kind)
    }

    /// Guards sensor construction; outside a top-level browsing context
    /// the constructor must refuse with `SecurityError`.
    pub fn ensure_top_level(&self) -> Result<(), SensorError> {
        if self.top_level_context {
            Ok(())
        } else {
            Err(SensorError::security(
                "Sensors are only available in a top-level browsing context",
            ))
        }
    }

    pub fn screen_angle(&self) -> &ScreenAngle {
        &self.screen_angle
    }

    pub fn set_screen_angle(&self, degrees: f64) {
        self.screen_angle.set_degrees(degrees);
    }

    /// Injects a legacy `devicemotion` event into the hub.
    pub fn push_motion(&self, event: &DeviceMotionEvent) {
        self.hub.push_motion(event);
    }

    /// Injects a legacy `deviceorientation` event into the hub.
    pub fn push_orientation(&self, event: &DeviceOrientationEvent) {
        self.hub.push_orientation(event);
    }

    /// Injects a legacy `deviceorientationabsolute` event into the hub.
    pub fn push_orientation_absolute(&self, event: &DeviceOrientationEvent) {
        self.hub.push_orientation_absolute(event);
    }

    /// Injects a host reading for a native-backed kind.
    pub fn push_native_reading(&self, kind: SensorKind, reading: &NativeReading) {
        self.hub.push_native(kind, reading);
    }

    /// Schedules a callback `delay_ms` from now.
    pub fn set_timeout(&self, delay_ms: f64, callback: impl FnOnce() + 'static) -> TimerId {
        self.timers.schedule(self.clock.now_ms() + delay_ms, callback)
    }

    pub fn clear_timeout(&self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    /// Fires every timer due at the clock's current time.
    pub fn run_timers(&self) -> usize {
        self.timers.run_due(self.clock.now_ms())
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("top_level_context", &self.top_level_context)
            .field("screen_angle", &self.screen_angle.degrees())
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::device::LegacyEventKind;
    use std::cell::Cell;

    #[test]
    fn default_platform_is_top_level() {
        let platform = Platform::new(PlatformConfig::default());
        assert!(platform.ensure_top_level().is_ok());
        assert_eq!(
            platform.backend(SensorKind::Accelerometer),
            Backend::Polyfill(LegacyEventKind::DeviceMotion)
        );
    }

    #[test]
    fn nested_context_refuses_construction() {
        let platform = Platform::new(PlatformConfig {
            top_level_context: false,
            ..Default::default()
        });
        let error = platform.ensure_top_level().unwrap_err();
        assert_eq!(error.name, crate::error::SensorErrorName::Security);
    }

    #[test]
    fn timeouts_follow_the_injected_clock() {
        let clock = ManualClock::new();
        let platform = Platform::with_clock(PlatformConfig::default(), Rc::new(clock.clone()));
        let fired = Rc::new(Cell::new(false));
        {
            let fired = fired.clone();
            platform.set_timeout(100.0, move || fired.set(true));
        }

        clock.set(99.0);
        platform.run_timers();
        assert!(!fired.get());

        clock.set(100.0);
        platform.run_timers();
        assert!(fired.get());
    }

    #[test]
    fn screen_angle_updates_are_visible_through_handles() {
        let platform = Platform::new(PlatformConfig::default());
        let handle = platform.screen_angle().clone();
        platform.set_screen_angle(90.0);
        assert_eq!(handle.degrees(), 90.0);
        assert!((handle.radians() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
