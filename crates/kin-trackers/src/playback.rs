//! Playback direction switching.

use std::f64::consts::{PI, TAU};

use tracing::debug;

/// Forward/backward playback control for a 360 video walked in place.
///
/// Walking plays the video forward until the viewer turns around to
/// face the way they came (longitude near pi), then backward until
/// they face forward again (longitude near zero). Only the seam
/// regions flip the direction; everything in between leaves it alone.
#[derive(Debug, Clone)]
pub struct PlaybackDirection {
    reversed: bool,
    tolerance: f64,
}

impl PlaybackDirection {
    pub fn new() -> Self {
        Self::with_tolerance(0.2)
    }

    /// `tolerance` is the half-width, in radians, of the longitude
    /// bands around pi and zero that trigger a flip.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            reversed: false,
            tolerance,
        }
    }

    /// True while the video should play backward.
    pub fn reversed(&self) -> bool {
        self.reversed
    }

    /// Whether this longitude calls for flipping the travel direction.
    pub fn needs_change(&self, longitude: f64) -> bool {
        if self.reversed {
            longitude <= self.tolerance || longitude >= TAU - self.tolerance
        } else {
            (longitude - PI).abs() <= self.tolerance
        }
    }

    /// Applies a longitude reading; returns true when the direction
    /// flipped on this reading.
    pub fn update(&mut self, longitude: f64) -> bool {
        if self.needs_change(longitude) {
            self.reversed = !self.reversed;
            debug!("playback direction now {}", if self.reversed { "backward" } else { "forward" });
            true
        } else {
            false
        }
    }
}

impl Default for PlaybackDirection {
    fn default() -> Self {
        Self::new()
    }
}
