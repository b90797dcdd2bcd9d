//! Orientation sensor kinds.
//!
//! Relative and absolute orientation as unit quaternions derived from
//! the legacy `deviceorientation` streams. The absolute kind accepts
//! either the `absolute` flag or a compass heading as proof that the
//! angles are anchored to the earth frame.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use kin_core::{
    Backend, Clock, CoordinateSystem, DeviceEventSource, DeviceOrientationEvent, EventTarget,
    NativeReading, PermissionState, Permissions, Platform, ScreenAngle, SensorCore, SensorError,
    SensorEvent, SensorEventType, SensorKind, SensorOptions, SensorState,
};
use kin_math::Quaternion;

#[derive(Debug, Clone, Copy)]
enum OrientationVariant {
    Absolute,
    Relative,
}

struct OrientationInner {
    kind: SensorKind,
    variant: OrientationVariant,
    backend: Backend,
    core: SensorCore,
    source: DeviceEventSource,
    clock: Clock,
    permissions: Permissions,
    screen_angle: ScreenAngle,
    coordinate_system: CoordinateSystem,
    quaternion: Option<Quaternion>,
}

impl OrientationInner {
    /// Derives the orientation quaternion, or `None` when the event
    /// cannot back this kind.
    fn translate(&self, event: &DeviceOrientationEvent) -> Option<Quaternion> {
        match self.variant {
            OrientationVariant::Relative => {
                let (alpha, beta, gamma) = event.angles()?;
                Some(Quaternion::from_euler(alpha, beta, gamma))
            }
            OrientationVariant::Absolute => {
                let anchored = event.absolute || event.compass_heading.is_some();
                if !anchored {
                    return None;
                }
                // Compass headings grow clockwise while alpha grows
                // counter-clockwise.
                let alpha = match event.compass_heading {
                    Some(heading) => 360.0 - heading,
                    None => event.alpha?,
                };
                Some(Quaternion::from_euler(
                    alpha,
                    event.beta.unwrap_or(0.0),
                    event.gamma.unwrap_or(0.0),
                ))
            }
        }
    }

    /// Latest reading in the requested reference frame.
    fn oriented(&self) -> Option<Quaternion> {
        let quaternion = self.quaternion?;
        Some(match self.coordinate_system {
            CoordinateSystem::World => quaternion,
            CoordinateSystem::Screen => {
                quaternion.rotate_axis_angle([0.0, 0.0, 1.0], -self.screen_angle.radians())
            }
        })
    }
}

enum Ingest {
    Reading { first: bool, timestamp: f64 },
    Fault(SensorError),
    Skip,
}

/// Lifecycle plumbing shared by both orientation kinds.
#[derive(Clone)]
pub(crate) struct OrientationSensor {
    inner: Rc<RefCell<OrientationInner>>,
}

impl OrientationSensor {
    fn new(
        platform: &Platform,
        kind: SensorKind,
        variant: OrientationVariant,
        options: SensorOptions,
    ) -> Result<Self, SensorError> {
        platform.ensure_top_level()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(OrientationInner {
                kind,
                variant,
                backend: platform.backend(kind),
                core: SensorCore::new(&options),
                source: DeviceEventSource::new(platform.hub().clone()),
                clock: platform.clock(),
                permissions: platform.permissions().clone(),
                screen_angle: platform.screen_angle().clone(),
                coordinate_system: options.coordinate_system,
                quaternion: None,
            })),
        })
    }

    fn start(&self) {
        if !self.inner.borrow_mut().core.begin_activation() {
            return;
        }
        let (kind, backend, permissions) = {
            let inner = self.inner.borrow();
            (inner.kind, inner.backend, inner.permissions.clone())
        };
        if permissions.request(kind) == PermissionState::Denied {
            fail(
                &self.inner,
                SensorError::not_allowed("Permissions to access sensor are not granted"),
            );
            return;
        }
        match backend {
            Backend::Polyfill(stream) => {
                let inner = Rc::clone(&self.inner);
                self.inner
                    .borrow_mut()
                    .source
                    .attach_orientation(stream, move |event| ingest_orientation(&inner, event));
            }
            Backend::Native => {
                let inner = Rc::clone(&self.inner);
                self.inner
                    .borrow_mut()
                    .source
                    .attach_native(kind, move |reading| ingest_native(&inner, reading));
            }
            Backend::Unavailable => {
                fail(
                    &self.inner,
                    SensorError::not_readable("Could not connect to a sensor"),
                );
            }
        }
    }

    fn stop(&self) {
        {
            let inner = self.inner.borrow();
            if inner.core.state() == SensorState::Idle {
                return;
            }
            debug!("stopping '{}' sensor", inner.kind.as_str());
        }
        halt(&self.inner);
    }

    fn activated(&self) -> bool {
        self.inner.borrow().core.activated()
    }

    fn has_reading(&self) -> bool {
        self.inner.borrow().core.has_reading()
    }

    fn timestamp(&self) -> Option<f64> {
        self.inner.borrow().core.timestamp()
    }

    fn frequency(&self) -> Option<f64> {
        self.inner.borrow().core.frequency()
    }

    fn quaternion(&self) -> Option<Quaternion> {
        self.inner.borrow().oriented()
    }

    /// Writes the latest reading into a caller-allocated column-major
    /// 4x4 matrix; false when there is no reading to write.
    fn populate_matrix(&self, out: &mut [f64; 16]) -> bool {
        match self.quaternion() {
            Some(quaternion) => {
                quaternion.write_matrix(out);
                true
            }
            None => false,
        }
    }

    fn target(&self) -> EventTarget {
        self.inner.borrow().core.target().clone()
    }
}

impl fmt::Debug for OrientationSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("OrientationSensor")
            .field("kind", &inner.kind.as_str())
            .field("state", &inner.core.state())
            .finish_non_exhaustive()
    }
}

fn halt(inner_rc: &Rc<RefCell<OrientationInner>>) {
    let mut inner = inner_rc.borrow_mut();
    inner.source.detach();
    inner.core.reset();
    inner.quaternion = None;
}

fn fail(inner_rc: &Rc<RefCell<OrientationInner>>, error: SensorError) {
    let (target, timestamp) = {
        let mut inner = inner_rc.borrow_mut();
        inner.core.enter_error();
        debug!("'{}' sensor error: {}", inner.kind.as_str(), error);
        (inner.core.target().clone(), inner.clock.now_ms())
    };
    target.dispatch(&mut SensorEvent::error(error, timestamp));
    halt(inner_rc);
}

fn ingest_orientation(inner_rc: &Rc<RefCell<OrientationInner>>, event: &DeviceOrientationEvent) {
    let outcome = {
        let mut inner = inner_rc.borrow_mut();
        if !inner.core.accepts_readings() {
            Ingest::Skip
        } else {
            match inner.translate(event) {
                Some(quaternion) => {
                    let timestamp = inner.clock.now_ms();
                    inner.quaternion = Some(quaternion);
                    let first = inner.core.record_reading(timestamp);
                    Ingest::Reading { first, timestamp }
                }
                None => Ingest::Fault(SensorError::not_readable(
                    "Could not connect to a sensor",
                )),
            }
        }
    };
    settle(inner_rc, outcome);
}

fn ingest_native(inner_rc: &Rc<RefCell<OrientationInner>>, reading: &NativeReading) {
    let outcome = {
        let mut inner = inner_rc.borrow_mut();
        if !inner.core.accepts_readings() {
            Ingest::Skip
        } else {
            match reading {
                NativeReading::Orientation([x, y, z, w]) => {
                    let timestamp = inner.clock.now_ms();
                    inner.quaternion = Some(Quaternion::new(*x, *y, *z, *w));
                    let first = inner.core.record_reading(timestamp);
                    Ingest::Reading { first, timestamp }
                }
                _ => Ingest::Fault(SensorError::not_readable(
                    "Could not connect to a sensor",
                )),
            }
        }
    };
    settle(inner_rc, outcome);
}

fn settle(inner_rc: &Rc<RefCell<OrientationInner>>, outcome: Ingest) {
    match outcome {
        Ingest::Reading { first, timestamp } => {
            let target = inner_rc.borrow().core.target().clone();
            if first {
                target.dispatch(&mut SensorEvent::new(SensorEventType::Activate, timestamp));
            }
            target.dispatch(&mut SensorEvent::new(SensorEventType::Reading, timestamp));
        }
        Ingest::Fault(error) => fail(inner_rc, error),
        Ingest::Skip => {}
    }
}

macro_rules! orientation_kind {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $variant:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            sensor: OrientationSensor,
        }

        impl $name {
            pub fn new(platform: &Platform) -> Result<Self, SensorError> {
                Self::with_options(platform, SensorOptions::default())
            }

            pub fn with_options(
                platform: &Platform,
                options: SensorOptions,
            ) -> Result<Self, SensorError> {
                Ok(Self {
                    sensor: OrientationSensor::new(platform, $kind, $variant, options)?,
                })
            }

            /// Begins activation; a no-op unless the sensor is idle.
            pub fn start(&self) {
                self.sensor.start();
            }

            /// Returns to idle and drops the exposed reading; a no-op
            /// when already idle.
            pub fn stop(&self) {
                self.sensor.stop();
            }

            pub fn activated(&self) -> bool {
                self.sensor.activated()
            }

            pub fn has_reading(&self) -> bool {
                self.sensor.has_reading()
            }

            /// Monotonic milliseconds of the latest reading.
            pub fn timestamp(&self) -> Option<f64> {
                self.sensor.timestamp()
            }

            /// The honoured frequency hint, if any.
            pub fn frequency(&self) -> Option<f64> {
                self.sensor.frequency()
            }

            /// Latest orientation in the frame the sensor was
            /// constructed for.
            pub fn quaternion(&self) -> Option<Quaternion> {
                self.sensor.quaternion()
            }

            /// Writes the latest reading into a caller-allocated
            /// column-major 4x4 matrix; false without a reading.
            pub fn populate_matrix(&self, out: &mut [f64; 16]) -> bool {
                self.sensor.populate_matrix(out)
            }

            pub fn on_activate(&self, handler: impl Fn(&SensorEvent) + 'static) {
                self.sensor.target().set_handler(SensorEventType::Activate, handler);
            }

            pub fn on_reading(&self, handler: impl Fn(&SensorEvent) + 'static) {
                self.sensor.target().set_handler(SensorEventType::Reading, handler);
            }

            pub fn on_error(&self, handler: impl Fn(&SensorEvent) + 'static) {
                self.sensor.target().set_handler(SensorEventType::Error, handler);
            }

            /// The sensor's event target, for listener registration and
            /// bubbling configuration.
            pub fn events(&self) -> EventTarget {
                self.sensor.target()
            }
        }
    };
}

orientation_kind!(
    /// Orientation anchored to the earth frame.
    AbsoluteOrientationSensor,
    SensorKind::AbsoluteOrientation,
    OrientationVariant::Absolute
);

orientation_kind!(
    /// Orientation relative to an arbitrary stationary frame.
    RelativeOrientationSensor,
    SensorKind::RelativeOrientation,
    OrientationVariant::Relative
);
