//! Sample admission and window assembly.

use tracing::debug;

use kin_math::Vec3;

use crate::classify::detect_steps;
use crate::config::WalkConfig;

/// Accumulates accelerometer samples into disjoint classification
/// windows and issues one walking decision per window.
///
/// Owned by the consuming controller and fed once per accelerometer
/// tick; it keeps no relation to the sensor that produced the samples.
#[derive(Debug)]
pub struct WalkingDetector {
    config: WalkConfig,
    buffer: Vec<Vec3>,
    previous_magnitude: Option<f64>,
    discarded: usize,
    walking: bool,
}

impl WalkingDetector {
    pub fn new() -> Self {
        Self::with_config(WalkConfig::default())
    }

    pub fn with_config(config: WalkConfig) -> Self {
        let capacity = config.buffer_capacity();
        Self {
            config,
            buffer: Vec::with_capacity(capacity),
            previous_magnitude: None,
            discarded: 0,
            walking: false,
        }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Feeds one accelerometer sample.
    ///
    /// Samples whose magnitude stays within the admission delta of the
    /// previously admitted one are discarded; a window dominated by
    /// discards is abandoned as stationary. Returns a decision when a
    /// window completes either way, `None` while one is still filling.
    /// Windows never overlap: every decision clears the buffer, the
    /// discard counter and the admission seed.
    pub fn record(&mut self, sample: Vec3) -> Option<bool> {
        let magnitude = sample.magnitude();
        let admitted = match self.previous_magnitude {
            Some(previous) => (magnitude - previous).abs() > self.config.admission_delta,
            None => true,
        };

        if admitted {
            self.previous_magnitude = Some(magnitude);
            self.buffer.push(sample);
        } else {
            self.discarded += 1;
            if self.discarded > self.config.discard_limit() {
                debug!(
                    "window abandoned as stationary after {} discards",
                    self.discarded
                );
                self.clear_window();
                self.walking = false;
                return Some(false);
            }
        }

        if self.buffer.len() >= self.config.buffer_capacity() {
            let walking = detect_steps(&self.buffer, &self.config);
            self.clear_window();
            self.walking = walking;
            return Some(walking);
        }
        None
    }

    /// The most recent window decision.
    pub fn is_walking(&self) -> bool {
        self.walking
    }

    /// Admitted samples in the window currently filling.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drops the partial window without issuing a decision.
    pub fn reset(&mut self) {
        self.clear_window();
        self.walking = false;
    }

    fn clear_window(&mut self) {
        self.buffer.clear();
        self.previous_magnitude = None;
        self.discarded = 0;
    }
}

impl Default for WalkingDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_is_always_admitted() {
        let mut detector = WalkingDetector::new();
        assert_eq!(detector.record(Vec3::new(0.0, 0.0, 9.81)), None);
        assert_eq!(detector.buffered(), 1);
    }

    #[test]
    fn stationary_stream_short_circuits_to_not_walking() {
        let mut detector = WalkingDetector::new();
        let limit = detector.config().discard_limit();
        let sample = Vec3::new(0.0, 0.0, 9.81);

        let mut decision = None;
        let mut fed = 0;
        while decision.is_none() {
            decision = detector.record(sample);
            fed += 1;
        }
        // one admitted seed, then discards until the limit is exceeded
        assert_eq!(fed, limit + 2);
        assert_eq!(decision, Some(false));
        assert!(!detector.is_walking());
        assert_eq!(detector.buffered(), 0);
    }

    #[test]
    fn abandonment_reseeds_the_admission_filter() {
        let mut detector = WalkingDetector::new();
        let sample = Vec3::new(0.0, 0.0, 9.81);
        while detector.record(sample).is_none() {}
        // identical magnitude is admitted again after the reset
        assert_eq!(detector.record(sample), None);
        assert_eq!(detector.buffered(), 1);
    }

    #[test]
    fn reset_drops_the_partial_window() {
        let mut detector = WalkingDetector::new();
        detector.record(Vec3::new(0.0, 0.0, 9.0));
        detector.record(Vec3::new(0.0, 0.0, 10.0));
        detector.reset();
        assert_eq!(detector.buffered(), 0);
        assert!(!detector.is_walking());
    }

    #[test]
    fn decision_arrives_when_the_buffer_fills() {
        let mut detector = WalkingDetector::new();
        let capacity = detector.config().buffer_capacity();
        // alternate magnitudes so every sample passes admission
        let mut decisions = 0;
        for index in 0..capacity {
            let z = if index % 2 == 0 { 9.0 } else { 10.0 };
            if detector.record(Vec3::new(0.0, 0.0, z)).is_some() {
                decisions += 1;
                assert_eq!(index, capacity - 1);
            }
        }
        assert_eq!(decisions, 1);
        assert_eq!(detector.buffered(), 0);
    }
}
