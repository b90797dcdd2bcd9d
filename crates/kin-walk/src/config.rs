//! Classifier tuning.

use serde::{Deserialize, Serialize};

/// Tuning constants for the walking classifier.
///
/// The defaults are calibrated for a phone sampled at 50 Hz held or
/// pocketed while walking in place. Serialisable so tuned parameter
/// sets can be loaded alongside recorded traces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Accelerometer sampling rate, Hz.
    pub sampling_frequency: f64,
    /// Nominal span of one step window, seconds. A classification
    /// window covers two of these.
    pub step_window_seconds: f64,
    /// Minimum magnitude change against the previously admitted sample
    /// for a new sample to enter the buffer, m/s^2.
    pub admission_delta: f64,
    /// Recency weight of the exponential smoothing pass, `(0, 1]`.
    pub smoothing_factor: f64,
    /// Divisor in the extremum acceptance band
    /// `band = 0.5 + stddev / deviation_alpha`.
    pub deviation_alpha: f64,
    /// Peak/valley pairs closer than this many samples are noise.
    pub min_pair_separation: usize,
    /// Upper bound on the coefficient of variation of pair distances.
    pub variation_limit: f64,
    /// Largest tolerated difference between peak and valley counts.
    pub imbalance_bound: usize,
    /// Upper bound on the standard deviation of the gravity-removed
    /// magnitudes, m/s^2; louder windows are shaking, not stepping.
    pub detrended_deviation_limit: f64,
    /// Dominant DFT bins above this index classify as walking outright.
    pub fast_cadence_bin: usize,
    /// Gravity magnitude removed before spectral analysis, m/s^2.
    pub gravity: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            sampling_frequency: 50.0,
            step_window_seconds: 1.6,
            admission_delta: 0.05,
            smoothing_factor: 0.7,
            deviation_alpha: 4.0,
            min_pair_separation: 10,
            variation_limit: 0.7,
            imbalance_bound: 2,
            detrended_deviation_limit: 6.0,
            fast_cadence_bin: 4,
            gravity: 9.81,
        }
    }
}

impl WalkConfig {
    /// Samples per classification window: two step windows' worth.
    pub fn buffer_capacity(&self) -> usize {
        (2.0 * self.step_window_seconds * self.sampling_frequency) as usize
    }

    /// Discards tolerated before the window is abandoned as stationary.
    pub fn discard_limit(&self) -> usize {
        self.buffer_capacity() / 8
    }
}
