// pluck-core/src/lib.rs

//! The core logic for the string tuner.
//! This crate turns a live PCM stream into a stable pitch readout:
//! framing, gating, autocorrelation pitch estimation, filtering, note
//! mapping and the hold policy. It is completely headless and contains
//! no GUI code.

pub mod analyzer;
pub mod audio;
pub mod buffer;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod filter;
pub mod gate;
pub mod hold;
pub mod latest;
pub mod pitch;
pub mod session;
pub mod tuning;

pub use analyzer::Analyzer;
pub use config::TunerConfig;
pub use display::{DisplayState, DisplayTracker, SignalTier};
pub use error::{CaptureError, ConfigError, SessionError};
pub use session::Session;

/// One stable pitch reading.
///
/// Immutable once built; a newer observation replaces it entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchObservation {
    frequency_hz: f32,
    note_name: String,
    cents: i32,
}

impl PitchObservation {
    pub fn new(frequency_hz: f32, note_name: impl Into<String>, cents: i32) -> Self {
        Self {
            frequency_hz,
            note_name: note_name.into(),
            cents,
        }
    }

    /// The median-filtered frequency in Hz.
    pub fn frequency_hz(&self) -> f32 {
        self.frequency_hz
    }

    /// Nearest note with octave, e.g. "A2".
    pub fn note_name(&self) -> &str {
        &self.note_name
    }

    /// Deviation from the nearest note after the zero deadband.
    pub fn cents(&self) -> i32 {
        self.cents
    }
}

/// Which stage declined to produce a pitch for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decline {
    /// The ring buffer has not yet seen a full frame.
    Filling,
    GateClosed,
    /// The gate opened too recently.
    AttackSuppressed,
    /// Silence or no clear periodicity in the frame.
    NoPitch,
}

/// The outcome of analysing one audio chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult {
    Observation(PitchObservation),
    NoObservation(Decline),
}

impl PipelineResult {
    pub fn observation(&self) -> Option<&PitchObservation> {
        match self {
            PipelineResult::Observation(observation) => Some(observation),
            PipelineResult::NoObservation(_) => None,
        }
    }
}
