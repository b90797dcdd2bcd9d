//! Motion sensor kinds.
//!
//! Accelerometer, linear acceleration, gravity and gyroscope readings,
//! all cut from the same `devicemotion` cloth: one shared inner drives
//! the lifecycle, each public kind picks which axes of the event it
//! exposes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use kin_core::{
    Backend, Clock, DeviceEventSource, DeviceMotionEvent, EventTarget, NativeReading,
    PermissionState, Permissions, Platform, SensorCore, SensorError, SensorEvent, SensorEventType,
    SensorKind, SensorOptions, SensorState,
};

/// Which slice of a `devicemotion` event a kind reads.
#[derive(Debug, Clone, Copy)]
enum MotionVariant {
    IncludingGravity,
    Linear,
    Gravity,
    RotationRate,
}

struct MotionInner {
    kind: SensorKind,
    variant: MotionVariant,
    backend: Backend,
    core: SensorCore,
    source: DeviceEventSource,
    clock: Clock,
    permissions: Permissions,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
}

impl MotionInner {
    /// Extracts this kind's axes from the event, or `None` when any
    /// required axis is null.
    fn translate(&self, event: &DeviceMotionEvent) -> Option<(f64, f64, f64)> {
        match self.variant {
            MotionVariant::IncludingGravity => event
                .acceleration_including_gravity
                .and_then(|axes| axes.all()),
            MotionVariant::Linear => event.acceleration.and_then(|axes| axes.all()),
            MotionVariant::Gravity => {
                let (gx, gy, gz) = event
                    .acceleration_including_gravity
                    .and_then(|axes| axes.all())?;
                let (ax, ay, az) = event.acceleration.and_then(|axes| axes.all())?;
                Some((gx - ax, gy - ay, gz - az))
            }
            // Legacy rotation rates name their axes after the Euler
            // angles: alpha spins about z, beta about x, gamma about y.
            MotionVariant::RotationRate => event
                .rotation_rate
                .and_then(|rate| rate.all())
                .map(|(alpha, beta, gamma)| (beta, gamma, alpha)),
        }
    }

    fn clear_reading(&mut self) {
        self.x = None;
        self.y = None;
        self.z = None;
    }
}

enum Ingest {
    Reading { first: bool, timestamp: f64 },
    Fault(SensorError),
    Skip,
}

/// Lifecycle plumbing shared by the four motion kinds.
#[derive(Clone)]
pub(crate) struct MotionSensor {
    inner: Rc<RefCell<MotionInner>>,
}

impl MotionSensor {
    fn new(
        platform: &Platform,
        kind: SensorKind,
        variant: MotionVariant,
        options: SensorOptions,
    ) -> Result<Self, SensorError> {
        platform.ensure_top_level()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(MotionInner {
                kind,
                variant,
                backend: platform.backend(kind),
                core: SensorCore::new(&options),
                source: DeviceEventSource::new(platform.hub().clone()),
                clock: platform.clock(),
                permissions: platform.permissions().clone(),
                x: None,
                y: None,
                z: None,
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
            Backend::Polyfill(_) => {
                let inner = Rc::clone(&self.inner);
                self.inner
                    .borrow_mut()
                    .source
                    .attach_motion(move |event| ingest_motion(&inner, event));
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

    fn axes(&self) -> (Option<f64>, Option<f64>, Option<f64>) {
        let inner = self.inner.borrow();
        (inner.x, inner.y, inner.z)
    }

    fn target(&self) -> EventTarget {
        self.inner.borrow().core.target().clone()
    }
}

impl fmt::Debug for MotionSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("MotionSensor")
            .field("kind", &inner.kind.as_str())
            .field("state", &inner.core.state())
            .finish_non_exhaustive()
    }
}

fn halt(inner_rc: &Rc<RefCell<MotionInner>>) {
    let mut inner = inner_rc.borrow_mut();
    inner.source.detach();
    inner.core.reset();
    inner.clear_reading();
}

/// Error path: notify, then tear down back to idle.
fn fail(inner_rc: &Rc<RefCell<MotionInner>>, error: SensorError) {
    let (target, timestamp) = {
        let mut inner = inner_rc.borrow_mut();
        inner.core.enter_error();
        debug!("'{}' sensor error: {}", inner.kind.as_str(), error);
        (inner.core.target().clone(), inner.clock.now_ms())
    };
    target.dispatch(&mut SensorEvent::error(error, timestamp));
    halt(inner_rc);
}

fn ingest_motion(inner_rc: &Rc<RefCell<MotionInner>>, event: &DeviceMotionEvent) {
    let outcome = {
        let mut inner = inner_rc.borrow_mut();
        if !inner.core.accepts_readings() {
            Ingest::Skip
        } else {
            match inner.translate(event) {
                Some((x, y, z)) => {
                    let timestamp = inner.clock.now_ms();
                    inner.x = Some(x);
                    inner.y = Some(y);
                    inner.z = Some(z);
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

fn ingest_native(inner_rc: &Rc<RefCell<MotionInner>>, reading: &NativeReading) {
    let outcome = {
        let mut inner = inner_rc.borrow_mut();
        if !inner.core.accepts_readings() {
            Ingest::Skip
        } else {
            match reading {
                NativeReading::Axes { x, y, z } => {
                    let timestamp = inner.clock.now_ms();
                    inner.x = Some(*x);
                    inner.y = Some(*y);
                    inner.z = Some(*z);
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

fn settle(inner_rc: &Rc<RefCell<MotionInner>>, outcome: Ingest) {
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

macro_rules! motion_kind {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $variant:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            sensor: MotionSensor,
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
                    sensor: MotionSensor::new(platform, $kind, $variant, options)?,
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

            pub fn x(&self) -> Option<f64> {
                self.sensor.axes().0
            }

            pub fn y(&self) -> Option<f64> {
                self.sensor.axes().1
            }

            pub fn z(&self) -> Option<f64> {
                self.sensor.axes().2
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

motion_kind!(
    /// Device acceleration including gravity, m/s^2.
    Accelerometer,
    SensorKind::Accelerometer,
    MotionVariant::IncludingGravity
);

motion_kind!(
    /// Device acceleration with the gravity contribution removed, m/s^2.
    LinearAccelerationSensor,
    SensorKind::LinearAcceleration,
    MotionVariant::Linear
);

motion_kind!(
    /// The gravity contribution alone, m/s^2.
    GravitySensor,
    SensorKind::Gravity,
    MotionVariant::Gravity
);

motion_kind!(
    /// Angular velocity about the device axes, deg/s.
    Gyroscope,
    SensorKind::Gyroscope,
    MotionVariant::RotationRate
);
