//! Device event attachment.
//!
//! The single point where a sensor binds to (and releases) a hub
//! stream. Holding attachment in one place keeps the start/stop paths
//! symmetrical: whatever start attached, stop detaches.

use crate::device::{DeviceMotionEvent, DeviceOrientationEvent, LegacyEventKind};
use crate::hub::{DeviceEventHub, NativeReading, SubscriptionId};
use crate::registry::SensorKind;

/// One sensor's subscription to the device event hub.
///
/// At most one stream is attached at a time; attaching again replaces
/// the previous subscription.
#[derive(Debug)]
pub struct DeviceEventSource {
    hub: DeviceEventHub,
    subscription: Option<SubscriptionId>,
}

impl DeviceEventSource {
    pub fn new(hub: DeviceEventHub) -> Self {
        Self {
            hub,
            subscription: None,
        }
    }

    pub fn attach_motion(&mut self, callback: impl Fn(&DeviceMotionEvent) + 'static) {
        self.detach();
        self.subscription = Some(self.hub.subscribe_motion(callback));
    }

    pub fn attach_orientation(
        &mut self,
        kind: LegacyEventKind,
        callback: impl Fn(&DeviceOrientationEvent) + 'static,
    ) {
        self.detach();
        self.subscription = Some(match kind {
            LegacyEventKind::DeviceOrientationAbsolute => {
                self.hub.subscribe_orientation_absolute(callback)
            }
            _ => self.hub.subscribe_orientation(callback),
        });
    }

    pub fn attach_native(&mut self, kind: SensorKind, callback: impl Fn(&NativeReading) + 'static) {
        self.detach();
        self.subscription = Some(self.hub.subscribe_native(kind, callback));
    }

    /// Releases the current subscription, if any.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.hub.unsubscribe(id);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }
}
