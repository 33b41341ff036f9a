//! # Configuration Module
//!
//! Every tunable of the analysis pipeline lives in [`TunerConfig`]. All
//! fields have defaults suited to a plucked guitar or bass string, and any
//! subset can be overridden from JSON since missing fields fall back to
//! [`TunerConfig::default`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Tunable parameters of one analysis session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Requested capture rate in Hz. The device may pick a different one.
    pub sample_rate: u32,
    /// Number of samples per analysis frame.
    pub frame_size: usize,
    /// Lowest detectable fundamental in Hz.
    pub min_hz: f32,
    /// Highest detectable fundamental in Hz.
    pub max_hz: f32,
    /// Minimum ratio of peak correlation to frame energy.
    pub min_correlation: f32,
    /// Estimates above `max_hz * upper_margin` are rejected.
    pub upper_margin: f32,
    /// Frames quieter than this never reach the lag search.
    pub min_rms_db: f32,
    pub gate_open_db: f32,
    pub gate_close_db: f32,
    /// Window after the gate opens during which estimates are ignored.
    pub attack_ignore_ms: u64,
    pub median_size: usize,
    /// Deviations within this many cents are shown as exactly zero.
    pub snap_to_zero_cents: i32,
    pub short_hold_ms: u64,
    pub long_hold_ms: u64,
    /// Continuous signal needed before the long hold applies.
    pub long_hold_after_ms: u64,
    pub in_tune_cents: i32,
    /// EMA factor for the displayed cents, in (0, 1].
    pub smoothing_alpha: f32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            frame_size: 4096,
            min_hz: 50.0,
            max_hz: 1200.0,
            min_correlation: 0.5,
            upper_margin: 0.98,
            min_rms_db: -75.0,
            gate_open_db: -72.0,
            gate_close_db: -80.0,
            attack_ignore_ms: 80,
            median_size: 5,
            snap_to_zero_cents: 2,
            short_hold_ms: 400,
            long_hold_ms: 1500,
            long_hold_after_ms: 600,
            in_tune_cents: 5,
            smoothing_alpha: 0.3,
        }
    }
}

impl TunerConfig {
    /// Checks every parameter and parameter combination.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.frame_size < 2 {
            return Err(ConfigError::FrameTooSmall(self.frame_size));
        }
        let (min_lag, max_lag) = lag_range(self.sample_rate, self.frame_size, self.min_hz, self.max_hz)?;
        if min_lag >= max_lag {
            return Err(ConfigError::EmptyLagRange { min_lag, max_lag });
        }
        if self.gate_open_db <= self.gate_close_db {
            return Err(ConfigError::GateThresholds {
                open_db: self.gate_open_db,
                close_db: self.gate_close_db,
            });
        }
        if self.median_size == 0 {
            return Err(ConfigError::EmptyMedianWindow);
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "smoothing_alpha",
                value: self.smoothing_alpha,
            });
        }
        if !(0.0..=1.0).contains(&self.min_correlation) {
            return Err(ConfigError::OutOfRange {
                name: "min_correlation",
                value: self.min_correlation,
            });
        }
        if !(self.upper_margin.is_finite() && self.upper_margin > 0.0) {
            return Err(ConfigError::OutOfRange {
                name: "upper_margin",
                value: self.upper_margin,
            });
        }
        if self.snap_to_zero_cents < 0 {
            return Err(ConfigError::OutOfRange {
                name: "snap_to_zero_cents",
                value: self.snap_to_zero_cents as f32,
            });
        }
        Ok(())
    }

    /// Returns a copy with the sample rate replaced, for when the device
    /// runs at a rate other than the requested one.
    pub fn with_sample_rate(&self, sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..self.clone()
        }
    }

    pub fn attack_ignore(&self) -> Duration {
        Duration::from_millis(self.attack_ignore_ms)
    }

    pub fn short_hold(&self) -> Duration {
        Duration::from_millis(self.short_hold_ms)
    }

    pub fn long_hold(&self) -> Duration {
        Duration::from_millis(self.long_hold_ms)
    }

    pub fn long_hold_after(&self) -> Duration {
        Duration::from_millis(self.long_hold_after_ms)
    }
}

/// Derives the autocorrelation lag bounds from the frequency bounds.
///
/// `min_lag = floor(sr / max_hz)` (at least 1) and
/// `max_lag = floor(sr / min_hz)` (at most `frame_size - 1`).
pub fn lag_range(sample_rate: u32, frame_size: usize, min_hz: f32, max_hz: f32) -> ConfigResult<(usize, usize)> {
    let valid = min_hz.is_finite() && max_hz.is_finite() && min_hz > 0.0 && max_hz > min_hz;
    if !valid {
        return Err(ConfigError::InvalidFrequencyRange { min: min_hz, max: max_hz });
    }
    let sr = sample_rate as f32;
    let min_lag = ((sr / max_hz).floor() as usize).max(1);
    let max_lag = ((sr / min_hz).floor() as usize).min(frame_size.saturating_sub(1));
    Ok((min_lag, max_lag))
}
