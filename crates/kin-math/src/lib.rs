//! kin Math - rotation math for device orientation
//!
//! Unit quaternions and small vector helpers shared by the sensor
//! adapters and the motion classifiers. No SIMD, no generics - the
//! readings arrive at tens of hertz, clarity wins.

mod quaternion;
mod vec;

pub use quaternion::Quaternion;
pub use vec::Vec3;
