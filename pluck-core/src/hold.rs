//! # Hold Policy Module
//!
//! Turns the intermittent stream of pipeline results into a temporally
//! stable value. After live data stops, the last observation stays on
//! screen for a short hold, or for a long hold once the signal has been
//! continuous for long enough. Each tick is evaluated purely from the
//! current instant and the recorded timestamps, so no timers are needed.

use std::time::{Duration, Instant};

use crate::PitchObservation;
use crate::config::TunerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Empty,
    /// The value came from the current tick.
    Live,
    ShortHold,
    LongHold,
}

/// What the hold policy displays after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldOutput<'a> {
    pub phase: HoldPhase,
    pub value: Option<&'a PitchObservation>,
}

#[derive(Debug, Clone, Default)]
struct HoldState {
    last_value: Option<PitchObservation>,
    last_non_null_at: Option<Instant>,
    continuity_start: Option<Instant>,
    long_hold_eligible: bool,
}

/// Two-tier hold over a nullable observation stream.
#[derive(Debug, Clone)]
pub struct HoldPolicy {
    short_hold: Duration,
    long_hold: Duration,
    long_hold_after: Duration,
    state: HoldState,
}

impl HoldPolicy {
    pub fn new(short_hold: Duration, long_hold: Duration, long_hold_after: Duration) -> Self {
        Self {
            short_hold,
            long_hold,
            long_hold_after,
            state: HoldState::default(),
        }
    }

    pub fn from_config(config: &TunerConfig) -> Self {
        Self::new(config.short_hold(), config.long_hold(), config.long_hold_after())
    }

    /// Feeds one tick of the observation stream.
    ///
    /// # Arguments
    /// * `now` - Instant of this tick, monotonically non-decreasing
    /// * `observation` - The fresh observation, or `None` if the pipeline declined
    ///
    /// # Returns
    /// * `HoldOutput` - The phase and the value to display, which is either
    ///   the fresh observation or the held one
    pub fn tick(&mut self, now: Instant, observation: Option<&PitchObservation>) -> HoldOutput<'_> {
        let phase = match observation {
            Some(observation) => {
                let state = &mut self.state;
                state.last_value = Some(observation.clone());
                state.last_non_null_at = Some(now);
                let start = *state.continuity_start.get_or_insert(now);
                if now.saturating_duration_since(start) >= self.long_hold_after {
                    state.long_hold_eligible = true;
                }
                HoldPhase::Live
            }
            None => self.hold_phase(now),
        };
        HoldOutput {
            phase,
            value: self.state.last_value.as_ref(),
        }
    }

    fn hold_phase(&mut self, now: Instant) -> HoldPhase {
        let Some(last_at) = self.state.last_non_null_at else {
            self.state = HoldState::default();
            return HoldPhase::Empty;
        };
        let (window, phase) = if self.state.long_hold_eligible {
            (self.long_hold, HoldPhase::LongHold)
        } else {
            (self.short_hold, HoldPhase::ShortHold)
        };
        if now.saturating_duration_since(last_at) >= window {
            log::debug!("Hold of {:?} expired, clearing display", window);
            self.state = HoldState::default();
            HoldPhase::Empty
        } else {
            phase
        }
    }

    /// The value currently displayed, if any.
    pub fn value(&self) -> Option<&PitchObservation> {
        self.state.last_value.as_ref()
    }

    pub fn is_long_hold_eligible(&self) -> bool {
        self.state.long_hold_eligible
    }

    pub fn reset(&mut self) {
        self.state = HoldState::default();
    }
}
