//! kin Walk - walking detection from acceleration samples
//!
//! Classifies fixed-size, non-overlapping windows of accelerometer
//! samples as "walking" or "not walking". [`WalkingDetector`] owns the
//! admission-gated sample buffer and issues one decision per window;
//! [`detect_steps`] is the pure classifier underneath, usable on its
//! own when the caller assembles windows itself.

mod classify;
mod config;
mod detector;

pub use classify::detect_steps;
pub use config::WalkConfig;
pub use detector::WalkingDetector;
