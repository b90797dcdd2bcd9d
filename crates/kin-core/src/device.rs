//! Legacy device event payloads.
//!
//! The browser-era `devicemotion` / `deviceorientation` shapes the
//! polyfill layer adapts. Axis fields are optional because platforms
//! without the hardware deliver null values, and a reading is only
//! usable when every required axis is present.

/// Acceleration axes from a `devicemotion` event, m/s^2.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionAxes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl MotionAxes {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// All three axes, or `None` when any is null.
    pub fn all(&self) -> Option<(f64, f64, f64)> {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => Some((x, y, z)),
            _ => None,
        }
    }
}

/// Rotation rate from a `devicemotion` event, deg/s: alpha about z,
/// beta about x, gamma about y.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationRate {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl RotationRate {
    pub const fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
        }
    }

    pub fn all(&self) -> Option<(f64, f64, f64)> {
        match (self.alpha, self.beta, self.gamma) {
            (Some(alpha), Some(beta), Some(gamma)) => Some((alpha, beta, gamma)),
            _ => None,
        }
    }
}

/// A legacy `devicemotion` event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceMotionEvent {
    /// Acceleration with the gravity contribution removed.
    pub acceleration: Option<MotionAxes>,
    /// Raw accelerometer output, gravity included.
    pub acceleration_including_gravity: Option<MotionAxes>,
    pub rotation_rate: Option<RotationRate>,
    /// Hardware delivery interval in milliseconds.
    pub interval: f64,
}

/// A legacy `deviceorientation` / `deviceorientationabsolute` event.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceOrientationEvent {
    /// Rotation about z in degrees, `[0, 360)`.
    pub alpha: Option<f64>,
    /// Rotation about x in degrees, `[-180, 180)`.
    pub beta: Option<f64>,
    /// Rotation about y in degrees, `[-90, 90)`.
    pub gamma: Option<f64>,
    /// Whether the angles are anchored to the earth frame.
    pub absolute: bool,
    /// Compass heading in degrees, on platforms that report orientation
    /// through the compass instead of the `absolute` flag.
    pub compass_heading: Option<f64>,
}

impl DeviceOrientationEvent {
    pub const fn new(alpha: f64, beta: f64, gamma: f64, absolute: bool) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            absolute,
            compass_heading: None,
        }
    }

    /// All three angles, or `None` when any is null.
    pub fn angles(&self) -> Option<(f64, f64, f64)> {
        match (self.alpha, self.beta, self.gamma) {
            (Some(alpha), Some(beta), Some(gamma)) => Some((alpha, beta, gamma)),
            _ => None,
        }
    }
}

/// The legacy event streams a polyfilled sensor can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyEventKind {
    DeviceMotion,
    DeviceOrientation,
    DeviceOrientationAbsolute,
}

impl LegacyEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeviceMotion => "devicemotion",
            Self::DeviceOrientation => "deviceorientation",
            Self::DeviceOrientationAbsolute => "deviceorientationabsolute",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_axes_are_not_usable() {
        let axes = MotionAxes {
            x: Some(1.0),
            y: None,
            z: Some(3.0),
        };
        assert_eq!(axes.all(), None);
        assert_eq!(MotionAxes::new(1.0, 2.0, 3.0).all(), Some((1.0, 2.0, 3.0)));
    }

    #[test]
    fn orientation_angles_require_every_axis() {
        let mut event = DeviceOrientationEvent::new(10.0, 20.0, 30.0, false);
        assert_eq!(event.angles(), Some((10.0, 20.0, 30.0)));
        event.gamma = None;
        assert_eq!(event.angles(), None);
    }
}
