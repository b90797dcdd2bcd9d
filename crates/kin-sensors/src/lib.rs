//! kin Sensors - Generic Sensor API sensor kinds
//!
//! Concrete sensor types over the kin-core lifecycle machinery. On
//! hosts that only expose the legacy `devicemotion` and
//! `deviceorientation` events, each kind adapts the matching stream;
//! on hosts that serve a kind natively the same type consumes the
//! native feed instead. Which one happens is fixed per kind when the
//! platform is constructed, so applications never branch on it.

mod light;
mod motion;
mod orientation;

pub use light::AmbientLightSensor;
pub use motion::{Accelerometer, GravitySensor, Gyroscope, LinearAccelerationSensor};
pub use orientation::{AbsoluteOrientationSensor, RelativeOrientationSensor};
