//! kin Trackers - values derived from sensor readings
//!
//! The consumer-side companions to the sensor layer: each tracker
//! turns the latest orientation or acceleration reading into the value
//! an application actually steers by. View and tilt angles are
//! recomputed from scratch on every reading rather than integrated, so
//! they cannot drift.

mod playback;
mod punch;
mod tilt;
mod view;

pub use playback::PlaybackDirection;
pub use punch::{PunchConfig, PunchMeter};
pub use tilt::{TiltDirection, TiltTracker};
pub use view::ViewTracker;
