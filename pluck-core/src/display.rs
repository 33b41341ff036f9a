//! # Display Module
//!
//! Everything the presentation layer needs, computed on the analysis side:
//! the held observation, a smoothed cents value for the needle, the
//! in-tune flag and an emphasis level per signal tier. The smoothing is
//! cosmetic and never feeds back into the pipeline.

use std::time::Instant;

use crate::config::TunerConfig;
use crate::hold::{HoldPhase, HoldPolicy};
use crate::{PipelineResult, PitchObservation};

/// Opacity for a live reading.
pub const LIVE_OPACITY: f32 = 1.0;
/// Opacity while only a held reading is shown.
pub const HELD_OPACITY: f32 = 0.7;
/// Opacity with nothing to show.
pub const NO_SIGNAL_OPACITY: f32 = 0.35;

/// Exponential moving average over the displayed cents.
#[derive(Debug, Clone)]
pub struct DisplaySmoother {
    alpha: f32,
    smoothed: f32,
}

impl DisplaySmoother {
    pub fn new(alpha: f32) -> Self {
        Self { alpha, smoothed: 0.0 }
    }

    /// `smoothed * (1 - alpha) + raw * alpha` with signal, zero without.
    pub fn update(&mut self, raw_cents: i32, has_signal: bool) -> f32 {
        self.smoothed = if has_signal {
            self.smoothed * (1.0 - self.alpha) + raw_cents as f32 * self.alpha
        } else {
            0.0
        };
        self.smoothed
    }

    pub fn value(&self) -> f32 {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = 0.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalTier {
    Live,
    /// Only a held value from an earlier tick.
    Held,
    NoSignal,
}

impl SignalTier {
    pub fn opacity(self) -> f32 {
        match self {
            SignalTier::Live => LIVE_OPACITY,
            SignalTier::Held => HELD_OPACITY,
            SignalTier::NoSignal => NO_SIGNAL_OPACITY,
        }
    }
}

impl From<HoldPhase> for SignalTier {
    fn from(phase: HoldPhase) -> Self {
        match phase {
            HoldPhase::Live => SignalTier::Live,
            HoldPhase::ShortHold | HoldPhase::LongHold => SignalTier::Held,
            HoldPhase::Empty => SignalTier::NoSignal,
        }
    }
}

/// The state published to the presentation layer after every chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub observation: Option<PitchObservation>,
    pub tier: SignalTier,
    pub smoothed_cents: i32,
    /// Only ever true for a live reading.
    pub in_tune: bool,
    pub opacity: f32,
}

impl DisplayState {
    pub fn empty() -> Self {
        Self {
            observation: None,
            tier: SignalTier::NoSignal,
            smoothed_cents: 0,
            in_tune: false,
            opacity: NO_SIGNAL_OPACITY,
        }
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::empty()
    }
}

/// Hold policy plus smoother, fed one pipeline result per chunk.
#[derive(Debug, Clone)]
pub struct DisplayTracker {
    hold: HoldPolicy,
    smoother: DisplaySmoother,
    in_tune_cents: i32,
    had_signal: bool,
}

impl DisplayTracker {
    pub fn new(config: &TunerConfig) -> Self {
        Self {
            hold: HoldPolicy::from_config(config),
            smoother: DisplaySmoother::new(config.smoothing_alpha),
            in_tune_cents: config.in_tune_cents,
            had_signal: false,
        }
    }

    /// Advances the hold policy and smoother by one pipeline result.
    ///
    /// # Arguments
    /// * `now` - Instant the result was produced
    /// * `result` - Output of `Analyzer::process` for the chunk
    ///
    /// # Returns
    /// * `DisplayState` - Everything the presentation layer renders
    pub fn update(&mut self, now: Instant, result: &PipelineResult) -> DisplayState {
        let fresh = result.observation();
        let output = self.hold.tick(now, fresh);
        let tier = SignalTier::from(output.phase);
        let has_signal = tier != SignalTier::NoSignal;

        // Recompute only when a new value is shown or the signal flag flips.
        if fresh.is_some() || has_signal != self.had_signal {
            let raw = output.value.map_or(0, PitchObservation::cents);
            self.smoother.update(raw, has_signal);
        }
        self.had_signal = has_signal;

        let smoothed_cents = self.smoother.value().round() as i32;
        DisplayState {
            observation: output.value.cloned(),
            tier,
            smoothed_cents,
            in_tune: tier == SignalTier::Live && smoothed_cents.abs() <= self.in_tune_cents,
            opacity: tier.opacity(),
        }
    }

    pub fn reset(&mut self) {
        self.hold.reset();
        self.smoother.reset();
        self.had_signal = false;
    }
}
