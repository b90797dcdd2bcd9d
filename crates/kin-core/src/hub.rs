//! Legacy device event hub.
//!
//! Fan-out point between the host's device event streams and the
//! sensors subscribed to them. Each push walks a snapshot of the
//! subscriber list, so a callback tearing down its own subscription
//! (or a sibling's) never disturbs the delivery in flight.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::device::{DeviceMotionEvent, DeviceOrientationEvent, LegacyEventKind};
use crate::registry::SensorKind;

/// A reading served directly by the host for a native-backed kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeReading {
    /// Three-axis sample in the sensor's units.
    Axes { x: f64, y: f64, z: f64 },
    /// Orientation as `[x, y, z, w]` quaternion components.
    Orientation([f64; 4]),
    /// Light level in lux.
    Illuminance(f64),
}

pub type MotionCallback = Rc<dyn Fn(&DeviceMotionEvent)>;
pub type OrientationCallback = Rc<dyn Fn(&DeviceOrientationEvent)>;
pub type NativeCallback = Rc<dyn Fn(&NativeReading)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StreamKind {
    Legacy(LegacyEventKind),
    Native(SensorKind),
}

/// Handle for unsubscribing from a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    stream: StreamKind,
    serial: u64,
}

#[derive(Default)]
struct HubInner {
    motion: Vec<(u64, MotionCallback)>,
    orientation: Vec<(u64, OrientationCallback)>,
    orientation_absolute: Vec<(u64, OrientationCallback)>,
    native: HashMap<SensorKind, Vec<(u64, NativeCallback)>>,
    next_serial: u64,
}

impl HubInner {
    fn next_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }
}

/// Shared fan-out hub; clones address the same subscriber table.
#[derive(Clone, Default)]
pub struct DeviceEventHub {
    inner: Rc<RefCell<HubInner>>,
}

impl std::fmt::Debug for DeviceEventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DeviceEventHub")
            .field("motion", &inner.motion.len())
            .field("orientation", &inner.orientation.len())
            .field("orientation_absolute", &inner.orientation_absolute.len())
            .finish_non_exhaustive()
    }
}

impl DeviceEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_motion(&self, callback: impl Fn(&DeviceMotionEvent) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let serial = inner.next_serial();
        inner.motion.push((serial, Rc::new(callback)));
        trace!("devicemotion subscriber added ({serial})");
        SubscriptionId {
            stream: StreamKind::Legacy(LegacyEventKind::DeviceMotion),
            serial,
        }
    }

    pub fn subscribe_orientation(
        &self,
        callback: impl Fn(&DeviceOrientationEvent) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let serial = inner.next_serial();
        inner.orientation.push((serial, Rc::new(callback)));
        trace!("deviceorientation subscriber added ({serial})");
        SubscriptionId {
            stream: StreamKind::Legacy(LegacyEventKind::DeviceOrientation),
            serial,
        }
    }

    pub fn subscribe_orientation_absolute(
        &self,
        callback: impl Fn(&DeviceOrientationEvent) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let serial = inner.next_serial();
        inner.orientation_absolute.push((serial, Rc::new(callback)));
        trace!("deviceorientationabsolute subscriber added ({serial})");
        SubscriptionId {
            stream: StreamKind::Legacy(LegacyEventKind::DeviceOrientationAbsolute),
            serial,
        }
    }

    pub fn subscribe_native(
        &self,
        kind: SensorKind,
        callback: impl Fn(&NativeReading) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let serial = inner.next_serial();
        inner
            .native
            .entry(kind)
            .or_default()
            .push((serial, Rc::new(callback)));
        trace!("native {} subscriber added ({serial})", kind.as_str());
        SubscriptionId {
            stream: StreamKind::Native(kind),
            serial,
        }
    }

    /// Drops a subscription; returns false when it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        fn remove<T>(list: &mut Vec<(u64, T)>, serial: u64) -> bool {
            let before = list.len();
            list.retain(|(s, _)| *s != serial);
            list.len() != before
        }

        let mut inner = self.inner.borrow_mut();
        match id.stream {
            StreamKind::Legacy(LegacyEventKind::DeviceMotion) => {
                remove(&mut inner.motion, id.serial)
            }
            StreamKind::Legacy(LegacyEventKind::DeviceOrientation) => {
                remove(&mut inner.orientation, id.serial)
            }
            StreamKind::Legacy(LegacyEventKind::DeviceOrientationAbsolute) => {
                remove(&mut inner.orientation_absolute, id.serial)
            }
            StreamKind::Native(kind) => inner
                .native
                .get_mut(&kind)
                .is_some_and(|list| remove(list, id.serial)),
        }
    }

    pub fn push_motion(&self, event: &DeviceMotionEvent) {
        let callbacks: Vec<MotionCallback> = self
            .inner
            .borrow()
            .motion
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn push_orientation(&self, event: &DeviceOrientationEvent) {
        let callbacks: Vec<OrientationCallback> = self
            .inner
            .borrow()
            .orientation
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn push_orientation_absolute(&self, event: &DeviceOrientationEvent) {
        let callbacks: Vec<OrientationCallback> = self
            .inner
            .borrow()
            .orientation_absolute
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    pub fn push_native(&self, kind: SensorKind, reading: &NativeReading) {
        let callbacks: Vec<NativeCallback> = self
            .inner
            .borrow()
            .native
            .get(&kind)
            .map(|list| list.iter().map(|(_, callback)| callback.clone()).collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback(reading);
        }
    }

    /// Live subscriber count for one legacy stream.
    pub fn listener_count(&self, kind: LegacyEventKind) -> usize {
        let inner = self.inner.borrow();
        match kind {
            LegacyEventKind::DeviceMotion => inner.motion.len(),
            LegacyEventKind::DeviceOrientation => inner.orientation.len(),
            LegacyEventKind::DeviceOrientationAbsolute => inner.orientation_absolute.len(),
        }
    }

    pub fn native_listener_count(&self, kind: SensorKind) -> usize {
        self.inner
            .borrow()
            .native
            .get(&kind)
            .map_or(0, |list| list.len())
    }
}
