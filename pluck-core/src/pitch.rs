//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of one analysis frame
//! with a time-domain autocorrelation. No transform is needed, and the
//! search naturally favours the lowest strong periodic lag (the
//! fundamental) over its harmonics.
//!
//! ## Features
//! - DC offset removal before correlation
//! - Silence guard independent of the volume gate
//! - Valley skip so the zero-lag self-match is never reported
//! - Periodicity-strength check relative to frame energy

use crate::config::{TunerConfig, lag_range};
use crate::error::{ConfigError, ConfigResult};
use crate::gate::rms_to_db;

const ENERGY_EPSILON: f32 = 1e-12;

/// Autocorrelation pitch estimator for frames of a fixed size.
///
/// The scratch buffers are allocated once, so [`PitchEstimator::estimate`]
/// does not allocate.
#[derive(Debug, Clone)]
pub struct PitchEstimator {
    sample_rate: u32,
    frame_size: usize,
    max_hz: f32,
    min_lag: usize,
    max_lag: usize,
    min_correlation: f32,
    upper_margin: f32,
    min_rms_db: f32,
    centered: Vec<f32>,
    // Indexed by lag - min_lag.
    correlation: Vec<f32>,
}

impl PitchEstimator {
    /// Builds an estimator for `config.frame_size`-sample frames.
    ///
    /// Fails if the frequency bounds leave no lag to search.
    pub fn new(config: &TunerConfig) -> ConfigResult<Self> {
        if config.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(config.sample_rate));
        }
        let (min_lag, max_lag) = lag_range(config.sample_rate, config.frame_size, config.min_hz, config.max_hz)?;
        if min_lag >= max_lag {
            return Err(ConfigError::EmptyLagRange { min_lag, max_lag });
        }

        Ok(Self {
            sample_rate: config.sample_rate,
            frame_size: config.frame_size,
            max_hz: config.max_hz,
            min_lag,
            max_lag,
            min_correlation: config.min_correlation,
            upper_margin: config.upper_margin,
            min_rms_db: config.min_rms_db,
            centered: vec![0.0; config.frame_size],
            correlation: vec![0.0; max_lag - min_lag + 1],
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// The `(min_lag, max_lag)` search range in samples.
    pub fn lag_range(&self) -> (usize, usize) {
        (self.min_lag, self.max_lag)
    }

    /// Estimates the fundamental frequency of `frame` in Hz.
    ///
    /// # Returns
    /// * `Some(frequency)` - Detected fundamental
    /// * `None` - Silence, weak periodicity, or a frame of the wrong size
    pub fn estimate(&mut self, frame: &[f32]) -> Option<f32> {
        if frame.len() != self.frame_size {
            log::warn!(
                "Frame of {} samples passed to a {}-sample estimator",
                frame.len(),
                self.frame_size
            );
            return None;
        }
        let n = self.frame_size;

        // --- Remove DC bias ---
        let mean = frame.iter().sum::<f32>() / n as f32;
        for (dst, &src) in self.centered.iter_mut().zip(frame) {
            *dst = src - mean;
        }

        // --- Silence guard ---
        let energy: f32 = self.centered.iter().map(|&x| x * x).sum();
        let rms = (energy / n as f32).sqrt();
        if rms_to_db(rms) < self.min_rms_db {
            return None;
        }

        let (min_lag, max_lag) = (self.min_lag, self.max_lag);
        if min_lag >= max_lag {
            return None;
        }

        // --- Unnormalized autocorrelation over the search range ---
        let x = &self.centered;
        for (slot, lag) in self.correlation.iter_mut().zip(min_lag..=max_lag) {
            *slot = x[..n - lag].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum();
        }

        // --- Step off the zero-lag slope onto the first valley ---
        let corr = &self.correlation;
        let mut valley = 0;
        while valley + 1 < corr.len() && corr[valley + 1] <= corr[valley] {
            valley += 1;
        }

        // --- Strongest periodic lag past the valley ---
        let (offset, best) = corr[valley..]
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |acc, (i, &c)| if c > acc.1 { (i, c) } else { acc });
        if !(best > 0.0) {
            return None;
        }
        let best_lag = min_lag + valley + offset;

        let frequency = self.sample_rate as f32 / best_lag as f32;

        // Lags at the very top of the range are boundary artifacts.
        if frequency > self.max_hz * self.upper_margin {
            return None;
        }

        // --- Periodicity strength ---
        if best / energy.max(ENERGY_EPSILON) < self.min_correlation {
            return None;
        }

        Some(frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 48_000;

    fn generate_sine(freq: f32, amplitude: f32, num_samples: usize) -> Vec<f32> {
        (0..num_samples)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
            .collect()
    }

    fn estimator() -> PitchEstimator {
        PitchEstimator::new(&TunerConfig::default()).unwrap()
    }

    fn assert_within_one_percent(detected: Option<f32>, expected: f32) {
        let detected = detected.unwrap_or_else(|| panic!("No pitch detected for {} Hz", expected));
        assert!(
            (detected - expected).abs() / expected <= 0.01,
            "Expected ~{} Hz, got {}",
            expected,
            detected
        );
    }

    #[test]
    fn detects_sines_across_the_range() {
        let mut detector = estimator();
        // Open strings of a guitar plus a few fretted notes.
        for &freq in &[82.41, 110.0, 146.83, 196.0, 246.94, 329.63, 440.0, 659.25] {
            let frame = generate_sine(freq, 0.5, 4096);
            assert_within_one_percent(detector.estimate(&frame), freq);
        }
    }

    #[test]
    fn prefers_fundamental_over_harmonics() {
        let mut detector = estimator();
        let frame: Vec<f32> = (0..4096)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let w = 2.0 * std::f32::consts::PI * 110.0 * t;
                0.5 * w.sin() + 0.25 * (2.0 * w).sin() + 0.15 * (3.0 * w).sin()
            })
            .collect();
        assert_within_one_percent(detector.estimate(&frame), 110.0);
    }

    #[test]
    fn ignores_dc_offset() {
        let mut detector = estimator();
        let frame: Vec<f32> = generate_sine(196.0, 0.3, 4096).iter().map(|s| s + 0.4).collect();
        assert_within_one_percent(detector.estimate(&frame), 196.0);
    }

    #[test]
    fn silence_has_no_estimate() {
        let mut detector = estimator();
        assert_eq!(detector.estimate(&vec![0.0; 4096]), None);
    }

    #[test]
    fn sub_floor_amplitude_has_no_estimate() {
        let mut detector = estimator();
        // Peak 1e-4 is about -83 dB RMS, under the -75 dB floor.
        let frame = generate_sine(110.0, 1e-4, 4096);
        assert_eq!(detector.estimate(&frame), None);
    }

    #[test]
    fn white_noise_has_no_estimate() {
        let mut detector = estimator();
        let mut state: u32 = 0x1234_5678;
        let frame: Vec<f32> = (0..4096)
            .map(|_| {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state as f32 / u32::MAX as f32) * 2.0 - 1.0
            })
            .collect();
        assert_eq!(detector.estimate(&frame), None);
    }

    #[test]
    fn rejects_wrong_frame_size() {
        let mut detector = estimator();
        let frame = generate_sine(110.0, 0.5, 2048);
        assert_eq!(detector.estimate(&frame), None);
    }

    #[test]
    fn rejects_empty_lag_range() {
        let config = TunerConfig {
            frame_size: 16,
            ..TunerConfig::default()
        };
        assert!(matches!(
            PitchEstimator::new(&config),
            Err(ConfigError::EmptyLagRange { .. })
        ));
    }

    #[test]
    fn derived_lag_range() {
        assert_eq!(estimator().lag_range(), (40, 960));
    }
}
