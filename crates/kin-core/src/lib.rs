//! kin Core - sensor lifecycle and platform plumbing
//!
//! The substrate every sensor kind is built on: the activation state
//! machine, the event-target dispatch model, the legacy device event
//! hub, capability resolution, permissions, clocks and timers, all
//! tied together by an explicit [`Platform`] context.
//!
//! Everything here is single-threaded by design; readings, events and
//! timers are pumped from one host loop.

pub mod clock;
pub mod device;
pub mod error;
pub mod event;
pub mod event_target;
pub mod hub;
pub mod permissions;
pub mod platform;
pub mod registry;
pub mod sensor;
pub mod source;
pub mod timers;

pub use clock::{Clock, ManualClock, MonotonicClock, TimeSource};
pub use device::{
    DeviceMotionEvent, DeviceOrientationEvent, LegacyEventKind, MotionAxes, RotationRate,
};
pub use error::{SensorError, SensorErrorName};
pub use event::{SensorEvent, SensorEventType, TargetId};
pub use event_target::{EventTarget, ListenerId};
pub use hub::{DeviceEventHub, NativeReading, SubscriptionId};
pub use permissions::{PermissionState, Permissions};
pub use platform::{Platform, PlatformConfig, ScreenAngle};
pub use registry::{Backend, Capabilities, SensorKind, SensorRegistry};
pub use sensor::{CoordinateSystem, FREQUENCY_FLOOR_HZ, SensorCore, SensorOptions, SensorState};
pub use source::DeviceEventSource;
pub use timers::{TimerId, Timers};
