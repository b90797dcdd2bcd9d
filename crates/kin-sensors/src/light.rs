//! Ambient light sensor.
//!
//! There is no legacy event stream carrying illuminance, so this kind
//! only works on hosts that serve it natively; everywhere else it
//! resolves to unavailable and fails activation with `NotReadable`.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use kin_core::{
    Backend, Clock, DeviceEventSource, EventTarget, NativeReading, PermissionState, Permissions,
    Platform, SensorCore, SensorError, SensorEvent, SensorEventType, SensorKind, SensorOptions,
    SensorState,
};

struct LightInner {
    backend: Backend,
    core: SensorCore,
    source: DeviceEventSource,
    clock: Clock,
    permissions: Permissions,
    illuminance: Option<f64>,
}

enum Ingest {
    Reading { first: bool, timestamp: f64 },
    Fault(SensorError),
    Skip,
}

/// Ambient light level in lux.
#[derive(Debug, Clone)]
pub struct AmbientLightSensor {
    inner: Rc<RefCell<LightInner>>,
}

impl AmbientLightSensor {
    pub fn new(platform: &Platform) -> Result<Self, SensorError> {
        Self::with_options(platform, SensorOptions::default())
    }

    pub fn with_options(platform: &Platform, options: SensorOptions) -> Result<Self, SensorError> {
        platform.ensure_top_level()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(LightInner {
                backend: platform.backend(SensorKind::AmbientLight),
                core: SensorCore::new(&options),
                source: DeviceEventSource::new(platform.hub().clone()),
                clock: platform.clock(),
                permissions: platform.permissions().clone(),
                illuminance: None,
            })),
        })
    }

    /// Begins activation; a no-op unless the sensor is idle.
    pub fn start(&self) {
        if !self.inner.borrow_mut().core.begin_activation() {
            return;
        }
        let (backend, permissions) = {
            let inner = self.inner.borrow();
            (inner.backend, inner.permissions.clone())
        };
        if permissions.request(SensorKind::AmbientLight) == PermissionState::Denied {
            fail(
                &self.inner,
                SensorError::not_allowed("Permissions to access sensor are not granted"),
            );
            return;
        }
        match backend {
            Backend::Native => {
                let inner = Rc::clone(&self.inner);
                self.inner
                    .borrow_mut()
                    .source
                    .attach_native(SensorKind::AmbientLight, move |reading| {
                        ingest(&inner, reading)
                    });
            }
            Backend::Polyfill(_) | Backend::Unavailable => {
                fail(
                    &self.inner,
                    SensorError::not_readable("Could not connect to a sensor"),
                );
            }
        }
    }

    /// Returns to idle and drops the exposed reading; a no-op when
    /// already idle.
    pub fn stop(&self) {
        {
            let inner = self.inner.borrow();
            if inner.core.state() == SensorState::Idle {
                return;
            }
            debug!("stopping 'ambient-light' sensor");
        }
        halt(&self.inner);
    }

    pub fn activated(&self) -> bool {
        self.inner.borrow().core.activated()
    }

    pub fn has_reading(&self) -> bool {
        self.inner.borrow().core.has_reading()
    }

    /// Monotonic milliseconds of the latest reading.
    pub fn timestamp(&self) -> Option<f64> {
        self.inner.borrow().core.timestamp()
    }

    /// The honoured frequency hint, if any.
    pub fn frequency(&self) -> Option<f64> {
        self.inner.borrow().core.frequency()
    }

    /// Light level in lux.
    pub fn illuminance(&self) -> Option<f64> {
        self.inner.borrow().illuminance
    }

    pub fn on_activate(&self, handler: impl Fn(&SensorEvent) + 'static) {
        self.events().set_handler(SensorEventType::Activate, handler);
    }

    pub fn on_reading(&self, handler: impl Fn(&SensorEvent) + 'static) {
        self.events().set_handler(SensorEventType::Reading, handler);
    }

    pub fn on_error(&self, handler: impl Fn(&SensorEvent) + 'static) {
        self.events().set_handler(SensorEventType::Error, handler);
    }

    /// The sensor's event target, for listener registration and
    /// bubbling configuration.
    pub fn events(&self) -> EventTarget {
        self.inner.borrow().core.target().clone()
    }
}

impl fmt::Debug for LightInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightInner")
            .field("state", &self.core.state())
            .field("illuminance", &self.illuminance)
            .finish_non_exhaustive()
    }
}

fn halt(inner_rc: &Rc<RefCell<LightInner>>) {
    let mut inner = inner_rc.borrow_mut();
    inner.source.detach();
    inner.core.reset();
    inner.illuminance = None;
}

fn fail(inner_rc: &Rc<RefCell<LightInner>>, error: SensorError) {
    let (target, timestamp) = {
        let mut inner = inner_rc.borrow_mut();
        inner.core.enter_error();
        debug!("'ambient-light' sensor error: {error}");
        (inner.core.target().clone(), inner.clock.now_ms())
    };
    target.dispatch(&mut SensorEvent::error(error, timestamp));
    halt(inner_rc);
}

fn ingest(inner_rc: &Rc<RefCell<LightInner>>, reading: &NativeReading) {
    let outcome = {
        let mut inner = inner_rc.borrow_mut();
        if !inner.core.accepts_readings() {
            Ingest::Skip
        } else {
            match reading {
                NativeReading::Illuminance(lux) => {
                    let timestamp = inner.clock.now_ms();
                    inner.illuminance = Some(*lux);
                    let first = inner.core.record_reading(timestamp);
                    Ingest::Reading { first, timestamp }
                }
                _ => Ingest::Fault(SensorError::not_readable(
                    "Could not connect to a sensor",
                )),
            }
        }
    };
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
