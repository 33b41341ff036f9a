//! # Analyzer Module
//!
//! The per-session pipeline. Every incoming chunk goes through, in order:
//! ring buffer, volume gate, attack suppressor, pitch estimator, median
//! filter, note mapper and cents deadband. Each chunk yields exactly one
//! [`PipelineResult`].
//!
//! All mutable filter state lives in the [`Analyzer`], which belongs to a
//! single session. Restarting a session means building a new one or
//! calling [`Analyzer::reset`].

use std::time::Instant;

use crate::buffer::RingBuffer;
use crate::clock::Clock;
use crate::config::TunerConfig;
use crate::error::ConfigResult;
use crate::filter::{CentsHysteresis, MedianFilter};
use crate::gate::{self, AttackSuppressor, GateState, GateTransition, VolumeGate};
use crate::pitch::PitchEstimator;
use crate::tuning;
use crate::{Decline, PipelineResult, PitchObservation};

/// Signal-to-pitch pipeline for one analysis session.
pub struct Analyzer<C: Clock> {
    clock: C,
    buffer: RingBuffer,
    frame: Vec<f32>,
    gate: VolumeGate,
    attack: AttackSuppressor,
    estimator: PitchEstimator,
    median: MedianFilter,
    hysteresis: CentsHysteresis,
}

impl<C: Clock> Analyzer<C> {
    /// Validates `config` and builds the pipeline.
    pub fn new(config: &TunerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;
        Ok(Self {
            clock,
            buffer: RingBuffer::new(config.frame_size),
            frame: vec![0.0; config.frame_size],
            gate: VolumeGate::new(config.gate_open_db, config.gate_close_db)?,
            attack: AttackSuppressor::new(config.attack_ignore()),
            estimator: PitchEstimator::new(config)?,
            median: MedianFilter::new(config.median_size)?,
            hysteresis: CentsHysteresis::new(config.snap_to_zero_cents),
        })
    }

    /// Runs one chunk through the pipeline.
    ///
    /// # Arguments
    /// * `chunk` - Mono samples in arrival order, any length
    ///
    /// # Returns
    /// * `PipelineResult::Observation` with the filtered pitch, or
    ///   `PipelineResult::NoObservation` naming the stage that declined
    pub fn process(&mut self, chunk: &[f32]) -> PipelineResult {
        // The buffer keeps accumulating whatever the gate says.
        self.buffer.push(chunk);
        if !self.buffer.is_ready() {
            return PipelineResult::NoObservation(Decline::Filling);
        }

        let now = self.clock.now();
        let db = gate::loudness_db(chunk);
        match self.gate.update(db) {
            GateTransition::Opened => {
                log::debug!("Gate opened at {:.1} dB", db);
                self.attack.arm(now);
            }
            GateTransition::Closed => log::debug!("Gate closed at {:.1} dB", db),
            GateTransition::None => {}
        }

        if !self.gate.is_open() {
            return PipelineResult::NoObservation(Decline::GateClosed);
        }
        if !self.attack.allows(now) {
            log::trace!("Attack window active, skipping chunk");
            return PipelineResult::NoObservation(Decline::AttackSuppressed);
        }

        self.buffer.snapshot_into(&mut self.frame);
        let Some(raw_hz) = self.estimator.estimate(&self.frame) else {
            log::trace!("No pitch in frame ({:.1} dB chunk)", db);
            return PipelineResult::NoObservation(Decline::NoPitch);
        };

        let frequency_hz = self.median.push(raw_hz);
        let Some(note) = tuning::nearest_note(frequency_hz) else {
            return PipelineResult::NoObservation(Decline::NoPitch);
        };
        let cents = self.hysteresis.apply(note.cents);
        log::trace!(
            "Estimated {:.2} Hz (median {:.2} Hz) -> {} {:+} cents",
            raw_hz,
            frequency_hz,
            note.name,
            cents
        );

        PipelineResult::Observation(PitchObservation::new(frequency_hz, note.name, cents))
    }

    /// The current instant on the session clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    /// Forgets all accumulated audio and filter state.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.gate.reset();
        self.attack.reset();
        self.median.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::gate::GatePosition;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn tone(freq: f32, amplitude: f32, start: usize, len: usize) -> Vec<f32> {
        (start..start + len)
            .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    fn analyzer(config: &TunerConfig) -> (Analyzer<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (Analyzer::new(config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn filling_until_first_full_frame() {
        let (mut analyzer, _) = analyzer(&TunerConfig::default());
        for i in 0..3 {
            let chunk = tone(110.0, 0.5, i * 1024, 1024);
            assert_eq!(analyzer.process(&chunk), PipelineResult::NoObservation(Decline::Filling));
        }
        // The gate is not consulted before the buffer is ready.
        assert_eq!(analyzer.gate_state().position, GatePosition::Closed);
    }

    #[test]
    fn silence_keeps_gate_closed() {
        let (mut analyzer, _) = analyzer(&TunerConfig::default());
        analyzer.process(&[0.0; 4096]);
        assert_eq!(
            analyzer.process(&[0.0; 1024]),
            PipelineResult::NoObservation(Decline::GateClosed)
        );
    }

    #[test]
    fn attack_window_then_observation() {
        let (mut analyzer, clock) = analyzer(&TunerConfig::default());
        let result = analyzer.process(&tone(110.0, 0.5, 0, 4096));
        assert_eq!(result, PipelineResult::NoObservation(Decline::AttackSuppressed));

        clock.advance_ms(50);
        let result = analyzer.process(&tone(110.0, 0.5, 4096, 1024));
        assert_eq!(result, PipelineResult::NoObservation(Decline::AttackSuppressed));

        clock.advance_ms(50);
        let result = analyzer.process(&tone(110.0, 0.5, 5120, 1024));
        let observation = result.observation().expect("observation after attack window");
        assert_eq!(observation.note_name(), "A2");
    }

    #[test]
    fn reopening_gate_restarts_attack_window() {
        let config = TunerConfig::default();
        let (mut analyzer, clock) = analyzer(&config);
        analyzer.process(&tone(110.0, 0.5, 0, 4096));
        clock.advance_ms(100);
        assert!(analyzer.process(&tone(110.0, 0.5, 4096, 1024)).observation().is_some());

        // A silent chunk closes the gate, the next loud one reopens it.
        clock.advance_ms(20);
        assert_eq!(
            analyzer.process(&[0.0; 1024]),
            PipelineResult::NoObservation(Decline::GateClosed)
        );
        clock.advance_ms(20);
        assert_eq!(
            analyzer.process(&tone(110.0, 0.5, 0, 1024)),
            PipelineResult::NoObservation(Decline::AttackSuppressed)
        );
    }

    #[test]
    fn median_smooths_frequency() {
        let config = TunerConfig {
            attack_ignore_ms: 0,
            ..TunerConfig::default()
        };
        let (mut analyzer, _) = analyzer(&config);
        let mut last = None;
        for i in 0..4 {
            last = analyzer.process(&tone(196.0, 0.5, i * 4096, 4096)).observation().cloned();
        }
        let observation = last.unwrap();
        assert_eq!(observation.note_name(), "G3");
        assert!((observation.frequency_hz() - 196.0).abs() < 196.0 * 0.01);
    }

    #[test]
    fn reset_starts_filling_again() {
        let config = TunerConfig {
            attack_ignore_ms: 0,
            ..TunerConfig::default()
        };
        let (mut analyzer, _) = analyzer(&config);
        assert!(analyzer.process(&tone(110.0, 0.5, 0, 4096)).observation().is_some());
        analyzer.reset();
        assert_eq!(
            analyzer.process(&tone(110.0, 0.5, 0, 1024)),
            PipelineResult::NoObservation(Decline::Filling)
        );
    }

    #[test]
    fn invalid_config_fails_fast() {
        let config = TunerConfig {
            gate_open_db: -90.0,
            ..TunerConfig::default()
        };
        assert!(Analyzer::new(&config, ManualClock::new()).is_err());
    }
}
