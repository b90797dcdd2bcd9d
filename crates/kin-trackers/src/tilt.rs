//! Paddle tilt.

use kin_math::{Quaternion, Vec3};

/// Which way the device is tilted about its long axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TiltDirection {
    Left,
    #[default]
    Level,
    Right,
}

/// Steering-style tilt derived from the orientation reading.
///
/// Measures how far the device x axis dips below the horizon, screen
/// compensated, and buckets the sign into a direction with a small
/// deadzone so a level device does not flutter between sides. Like the
/// view angles this is recomputed per reading and cannot drift.
#[derive(Debug, Clone)]
pub struct TiltTracker {
    deadzone_degrees: f64,
    direction: TiltDirection,
    angle_degrees: f64,
}

impl TiltTracker {
    pub fn new() -> Self {
        Self::with_deadzone(2.0)
    }

    pub fn with_deadzone(deadzone_degrees: f64) -> Self {
        Self {
            deadzone_degrees,
            direction: TiltDirection::Level,
            angle_degrees: 0.0,
        }
    }

    /// Recomputes tilt from an orientation reading.
    pub fn update(&mut self, orientation: &Quaternion, screen_angle_radians: f64) {
        let oriented = orientation.rotate_axis_angle([0.0, 0.0, 1.0], -screen_angle_radians);
        let side = oriented.rotate_vec(Vec3::new(1.0, 0.0, 0.0));
        let dip = (-side.z).clamp(-1.0, 1.0).asin().to_degrees();
        self.angle_degrees = dip;
        self.direction = if dip > self.deadzone_degrees {
            TiltDirection::Right
        } else if dip < -self.deadzone_degrees {
            TiltDirection::Left
        } else {
            TiltDirection::Level
        };
    }

    pub fn direction(&self) -> TiltDirection {
        self.direction
    }

    /// Signed tilt angle in degrees; positive tilts right.
    pub fn angle(&self) -> f64 {
        self.angle_degrees
    }
}

impl Default for TiltTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gamma_tilts_the_device_right() {
        let mut tracker = TiltTracker::new();
        tracker.update(&Quaternion::from_euler(0.0, 0.0, 30.0), 0.0);
        assert_eq!(tracker.direction(), TiltDirection::Right);
        assert!((tracker.angle() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn negative_gamma_tilts_left() {
        let mut tracker = TiltTracker::new();
        tracker.update(&Quaternion::from_euler(0.0, 0.0, -30.0), 0.0);
        assert_eq!(tracker.direction(), TiltDirection::Left);
        assert!((tracker.angle() + 30.0).abs() < 1e-9);
    }

    #[test]
    fn small_tilts_stay_level() {
        let mut tracker = TiltTracker::new();
        tracker.update(&Quaternion::from_euler(0.0, 0.0, 1.5), 0.0);
        assert_eq!(tracker.direction(), TiltDirection::Level);
        assert!(tracker.angle().abs() > 0.0);
    }

    #[test]
    fn deadzone_is_configurable() {
        let mut tracker = TiltTracker::with_deadzone(10.0);
        tracker.update(&Quaternion::from_euler(0.0, 0.0, 8.0), 0.0);
        assert_eq!(tracker.direction(), TiltDirection::Level);
        tracker.update(&Quaternion::from_euler(0.0, 0.0, 12.0), 0.0);
        assert_eq!(tracker.direction(), TiltDirection::Right);
    }
}
