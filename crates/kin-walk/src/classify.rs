//! Window classification.
//!
//! The pure half of walking detection: given one complete window of
//! admitted acceleration samples, decide whether its shape is stepping.
//! The pipeline is smoothing, a banded peak/valley scan, index pairing
//! and a statistical decision backed by a direct-summation discrete
//! Fourier transform over the gravity-removed magnitudes.

use tracing::debug;

use kin_math::Vec3;

use crate::config::WalkConfig;

/// Classifies one complete sample window as walking or not.
pub fn detect_steps(window: &[Vec3], config: &WalkConfig) -> bool {
    if window.len() < 3 {
        return false;
    }

    let mut magnitudes: Vec<f64> = window.iter().map(Vec3::magnitude).collect();
    smooth_in_place(&mut magnitudes, config.smoothing_factor);

    let (peaks, valleys) = find_extrema(&magnitudes, config);
    let pair_distances = pair_steps(&peaks, &valleys, config.min_pair_separation);

    let detrended: Vec<f64> = magnitudes.iter().map(|m| m - config.gravity).collect();

    // Fast cadences show up in the spectrum before the pairing
    // statistics settle.
    let cadence_bin = dominant_bin(&detrended);
    if cadence_bin > config.fast_cadence_bin {
        debug!("walking: dominant frequency bin {cadence_bin}");
        return true;
    }

    let window_seconds = window.len() as f64 / config.sampling_frequency;
    let enough_pairs = pair_distances.len() >= window_seconds.floor() as usize;

    // An empty pair set yields stddev NaN over min +inf here; the NaN
    // check below absorbs it as not-walking.
    let spread = stddev(&pair_distances);
    let shortest = pair_distances.iter().copied().fold(f64::INFINITY, f64::min);
    let variation = spread / shortest;
    let steady_cadence = !variation.is_nan() && variation < config.variation_limit;

    let balanced = peaks.len().abs_diff(valleys.len()) <= config.imbalance_bound;
    let calm = stddev(&detrended) < config.detrended_deviation_limit;

    let walking = enough_pairs && steady_cadence && balanced && calm;
    debug!(
        "window classified: walking={walking} (pairs={}, variation={variation:.3}, \
         peaks={}, valleys={}, bin={cadence_bin})",
        pair_distances.len(),
        peaks.len(),
        valleys.len(),
    );
    walking
}

/// Recency-weighted running average, applied in place.
fn smooth_in_place(samples: &mut [f64], factor: f64) {
    for index in 1..samples.len() {
        samples[index] = factor * samples[index] + (1.0 - factor) * samples[index - 1];
    }
}

/// Extremum candidates spaced by a running average interval; candidates
/// arriving sooner than half the established spacing are rejected.
struct SpacedExtrema {
    indices: Vec<usize>,
    average_spacing: f64,
    spacings: usize,
}

impl SpacedExtrema {
    fn new() -> Self {
        Self {
            indices: Vec::new(),
            average_spacing: 0.0,
            spacings: 0,
        }
    }

    fn offer(&mut self, index: usize) {
        if let Some(&last) = self.indices.last() {
            let spacing = (index - last) as f64;
            if self.spacings > 0 && spacing < self.average_spacing / 2.0 {
                return;
            }
            self.average_spacing = (self.average_spacing * self.spacings as f64 + spacing)
                / (self.spacings + 1) as f64;
            self.spacings += 1;
        }
        self.indices.push(index);
    }
}

/// Scans the smoothed sequence for step peaks and valleys.
fn find_extrema(samples: &[f64], config: &WalkConfig) -> (Vec<usize>, Vec<usize>) {
    let mean = mean(samples);
    let band = 0.5 + stddev(samples) / config.deviation_alpha;
    let mut peaks = SpacedExtrema::new();
    let mut valleys = SpacedExtrema::new();
    for index in 1..samples.len() - 1 {
        let value = samples[index];
        if value > samples[index - 1] && value > samples[index + 1] && value > mean + band {
            peaks.offer(index);
        } else if value < samples[index - 1] && value < samples[index + 1] && value < mean - band
        {
            valleys.offer(index);
        }
    }
    (peaks.indices, valleys.indices)
}

/// Pairs peaks and valleys at matching sequence position and keeps the
/// inter-event distances wide enough to be real steps.
fn pair_steps(peaks: &[usize], valleys: &[usize], min_separation: usize) -> Vec<f64> {
    peaks
        .iter()
        .zip(valleys)
        .map(|(&peak, &valley)| peak.abs_diff(valley))
        .filter(|&distance| distance >= min_separation)
        .map(|distance| distance as f64)
        .collect()
}

/// Index of the strongest frequency bin in `[1, n/2]`, by direct
/// summation. Deliberately quadratic: downstream thresholds were tuned
/// against this exact summation. Bins weaker than a 0.5 m/s^2 tone
/// report as 0, so neither a flat window's float residue nor broadband
/// jitter's random argmax is mistaken for a cadence.
fn dominant_bin(samples: &[f64]) -> usize {
    let n = samples.len();
    if n < 2 {
        return 0;
    }
    let mut best_bin = 0;
    let mut best_power = (0.5 * n as f64 / 2.0) * (0.5 * n as f64 / 2.0);
    for bin in 1..=n / 2 {
        let mut re = 0.0;
        let mut im = 0.0;
        for (t, &value) in samples.iter().enumerate() {
            let phase = 2.0 * std::f64::consts::PI * bin as f64 * t as f64 / n as f64;
            re += value * phase.cos();
            im -= value * phase.sin();
        }
        let power = re * re + im * im;
        if power > best_power {
            best_power = power;
            best_bin = bin;
        }
    }
    best_bin
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population standard deviation; NaN for an empty slice.
fn stddev(samples: &[f64]) -> f64 {
    let mean = mean(samples);
    let variance = samples
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / samples.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_window(amplitude: f64, frequency_hz: f64, config: &WalkConfig) -> Vec<Vec3> {
        (0..config.buffer_capacity())
            .map(|t| {
                let phase =
                    2.0 * std::f64::consts::PI * frequency_hz * t as f64 / config.sampling_frequency;
                Vec3::new(0.0, 0.0, config.gravity + amplitude * phase.sin())
            })
            .collect()
    }

    #[test]
    fn constant_window_is_not_walking() {
        let config = WalkConfig::default();
        let window = vec![Vec3::new(0.0, 0.0, config.gravity); config.buffer_capacity()];
        assert!(!detect_steps(&window, &config));
    }

    #[test]
    fn empty_and_tiny_windows_are_not_walking() {
        let config = WalkConfig::default();
        assert!(!detect_steps(&[], &config));
        assert!(!detect_steps(&[Vec3::new(0.0, 0.0, 9.81)], &config));
    }

    #[test]
    fn slow_cadence_walks_through_the_pairing_statistics() {
        let config = WalkConfig::default();
        // 1 Hz sits at bin 3 of a 160-sample window, below the fast
        // cadence cut, so the peak/valley statistics must carry it.
        let window = sine_window(3.0, 1.0, &config);
        assert!(detect_steps(&window, &config));
    }

    #[test]
    fn fast_cadence_walks_through_the_spectrum() {
        let config = WalkConfig::default();
        // 2 Hz lands at bin 6, above the fast cadence cut.
        let window = sine_window(3.0, 2.0, &config);
        assert!(detect_steps(&window, &config));
    }

    #[test]
    fn violent_shaking_is_not_walking() {
        let config = WalkConfig::default();
        // Periodic but far louder than stepping; the detrended
        // deviation bound rejects it on the statistical path.
        let window = sine_window(14.0, 1.0, &config);
        assert!(!detect_steps(&window, &config));
    }

    #[test]
    fn low_level_noise_is_not_walking() {
        let config = WalkConfig::default();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let window: Vec<Vec3> = (0..config.buffer_capacity())
            .map(|_| {
                // xorshift noise, amplitude below the acceptance band
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
                Vec3::new(0.0, 0.0, config.gravity + 0.3 * (unit - 0.5))
            })
            .collect();
        assert!(!detect_steps(&window, &config));
    }

    #[test]
    fn smoothing_keeps_first_sample_and_tracks_recency() {
        let mut samples = vec![10.0, 0.0, 0.0];
        smooth_in_place(&mut samples, 0.7);
        assert_eq!(samples[0], 10.0);
        assert!((samples[1] - 3.0).abs() < 1e-12);
        assert!((samples[2] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn dominant_bin_finds_a_pure_tone() {
        let n = 100;
        let samples: Vec<f64> = (0..n)
            .map(|t| (2.0 * std::f64::consts::PI * 7.0 * t as f64 / n as f64).sin())
            .collect();
        assert_eq!(dominant_bin(&samples), 7);
    }

    #[test]
    fn dominant_bin_of_a_flat_sequence_is_zero() {
        assert_eq!(dominant_bin(&[0.19; 160]), 0);
        assert_eq!(dominant_bin(&[]), 0);
    }

    #[test]
    fn close_pairs_are_discarded_as_noise() {
        let distances = pair_steps(&[5, 40, 80], &[12, 60, 110], 10);
        assert_eq!(distances, vec![20.0, 30.0]);
    }

    #[test]
    fn stddev_of_empty_slice_is_nan() {
        assert!(stddev(&[]).is_nan());
        assert_eq!(stddev(&[4.0, 4.0, 4.0]), 0.0);
    }

    #[test]
    fn spaced_extrema_reject_early_candidates() {
        let mut extrema = SpacedExtrema::new();
        extrema.offer(10);
        extrema.offer(60); // establishes an average spacing of 50
        extrema.offer(70); // 10 < 25, too soon
        extrema.offer(110);
        assert_eq!(extrema.indices, vec![10, 60, 110]);
    }
}
