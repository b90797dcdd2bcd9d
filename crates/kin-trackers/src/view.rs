//! Panorama view angles.

use std::f64::consts::TAU;

use kin_math::{Quaternion, Vec3};

/// Where the device is looking, as panorama angles.
///
/// Both angles are recomputed from scratch on every reading from the
/// orientation quaternion and the current screen angle; nothing is
/// integrated, so the tracker cannot drift. A large screen-angle jump
/// shows up as an equally large jump here.
#[derive(Debug, Clone, Default)]
pub struct ViewTracker {
    longitude: f64,
    latitude: f64,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes both angles from an orientation reading.
    pub fn update(&mut self, orientation: &Quaternion, screen_angle_radians: f64) {
        let oriented = orientation.rotate_axis_angle([0.0, 0.0, 1.0], -screen_angle_radians);
        // The camera looks out the back of the screen, along device -z.
        let view = oriented.rotate_vec(Vec3::new(0.0, 0.0, -1.0));
        self.longitude = wrap_longitude(f64::atan2(-view.x, view.y));
        self.latitude = view.z.clamp(-1.0, 1.0).asin();
    }

    /// Heading around the panorama, radians in `[0, 2pi)`; zero when
    /// the device is upright facing north.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Elevation, radians in `[-pi/2, pi/2]`; positive looking up.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

fn wrap_longitude(angle: f64) -> f64 {
    if angle < 0.0 { angle + TAU } else { angle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn upright_facing_north_is_the_origin() {
        let mut tracker = ViewTracker::new();
        tracker.update(&Quaternion::from_euler(0.0, 90.0, 0.0), 0.0);
        assert_close(tracker.longitude(), 0.0);
        assert_close(tracker.latitude(), 0.0);
    }

    #[test]
    fn alpha_sweeps_longitude_directly() {
        let mut tracker = ViewTracker::new();
        tracker.update(&Quaternion::from_euler(90.0, 90.0, 0.0), 0.0);
        assert_close(tracker.longitude(), FRAC_PI_2);

        tracker.update(&Quaternion::from_euler(180.0, 90.0, 0.0), 0.0);
        assert_close(tracker.longitude(), PI);

        // alpha past 180 wraps into the upper half of [0, 2pi)
        tracker.update(&Quaternion::from_euler(270.0, 90.0, 0.0), 0.0);
        assert_close(tracker.longitude(), 3.0 * FRAC_PI_2);
    }

    #[test]
    fn pitching_up_raises_latitude() {
        let mut tracker = ViewTracker::new();
        tracker.update(&Quaternion::from_euler(0.0, 135.0, 0.0), 0.0);
        assert_close(tracker.latitude(), FRAC_PI_4);

        tracker.update(&Quaternion::from_euler(0.0, 45.0, 0.0), 0.0);
        assert_close(tracker.latitude(), -FRAC_PI_4);
    }

    #[test]
    fn each_update_replaces_the_previous_reading() {
        let mut tracker = ViewTracker::new();
        tracker.update(&Quaternion::from_euler(90.0, 90.0, 0.0), 0.0);
        tracker.update(&Quaternion::from_euler(0.0, 90.0, 0.0), 0.0);
        assert_close(tracker.longitude(), 0.0);
        assert_close(tracker.latitude(), 0.0);
    }

    #[test]
    fn degenerate_quaternion_yields_finite_angles() {
        let mut tracker = ViewTracker::new();
        tracker.update(&Quaternion::new(0.0, 0.0, 0.0, 0.0), 0.0);
        assert!(tracker.longitude().is_finite());
        assert!(tracker.latitude().is_finite());
    }
}
