//! # Gate Module
//!
//! Decides whether a signal is present. The [`VolumeGate`] opens and closes
//! on chunk loudness with a hysteresis band so that a signal hovering at the
//! noise floor cannot make it chatter. The [`AttackSuppressor`] masks a
//! short window after every opening, while the pluck transient is still
//! acoustically unstable.

use std::time::{Duration, Instant};

use crate::error::{ConfigError, ConfigResult};

/// Floor applied to the RMS before converting to decibels.
const RMS_EPSILON: f32 = 1e-10;

/// Loudness of `samples` in dBFS, `20 * log10(max(rms, epsilon))`.
pub fn loudness_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 20.0 * RMS_EPSILON.log10();
    }
    let energy: f32 = samples.iter().map(|&s| s * s).sum();
    rms_to_db((energy / samples.len() as f32).sqrt())
}

pub(crate) fn rms_to_db(rms: f32) -> f32 {
    20.0 * rms.max(RMS_EPSILON).log10()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePosition {
    Closed,
    Open,
}

/// Gate position plus the reading that caused the last transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateState {
    pub position: GatePosition,
    /// `None` until the first transition.
    pub transition_db: Option<f32>,
}

/// What a single loudness reading did to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTransition {
    None,
    Opened,
    Closed,
}

/// Hysteretic open/close detector on loudness.
#[derive(Debug, Clone)]
pub struct VolumeGate {
    open_db: f32,
    close_db: f32,
    state: GateState,
}

impl VolumeGate {
    /// Fails when `open_db` is not strictly above `close_db`.
    pub fn new(open_db: f32, close_db: f32) -> ConfigResult<Self> {
        if !(open_db > close_db) {
            return Err(ConfigError::GateThresholds { open_db, close_db });
        }
        Ok(Self {
            open_db,
            close_db,
            state: GateState {
                position: GatePosition::Closed,
                transition_db: None,
            },
        })
    }

    /// Feeds one chunk's loudness reading.
    pub fn update(&mut self, db: f32) -> GateTransition {
        match self.state.position {
            GatePosition::Closed if db >= self.open_db => {
                self.state = GateState {
                    position: GatePosition::Open,
                    transition_db: Some(db),
                };
                GateTransition::Opened
            }
            GatePosition::Open if db <= self.close_db => {
                self.state = GateState {
                    position: GatePosition::Closed,
                    transition_db: Some(db),
                };
                GateTransition::Closed
            }
            _ => GateTransition::None,
        }
    }

    /// The "has signal" flag.
    pub fn is_open(&self) -> bool {
        self.state.position == GatePosition::Open
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = GateState {
            position: GatePosition::Closed,
            transition_db: None,
        };
    }
}

/// Masks estimates for `attack_ignore` after each gate opening.
#[derive(Debug, Clone)]
pub struct AttackSuppressor {
    attack_ignore: Duration,
    opened_at: Option<Instant>,
}

impl AttackSuppressor {
    pub fn new(attack_ignore: Duration) -> Self {
        Self {
            attack_ignore,
            opened_at: None,
        }
    }

    /// Restarts the window. Call on every Closed -> Open transition.
    pub fn arm(&mut self, now: Instant) {
        self.opened_at = Some(now);
    }

    /// False while the attack window since the last opening is running.
    ///
    /// Never allows before the first opening.
    pub fn allows(&self, now: Instant) -> bool {
        match self.opened_at {
            Some(opened_at) => now.saturating_duration_since(opened_at) >= self.attack_ignore,
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.opened_at = None;
    }
}
