//! End-to-end behaviour of the analysis pipeline and display tracker.

use pluck_core::clock::{Clock, ManualClock};
use pluck_core::{Analyzer, Decline, DisplayTracker, PipelineResult, SignalTier, TunerConfig};

const SAMPLE_RATE: f32 = 48_000.0;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tone(freq: f32, amplitude: f32, start: usize, len: usize) -> Vec<f32> {
    (start..start + len)
        .map(|i| amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
        .collect()
}

#[test]
fn clean_a2_frame_reads_a2_in_tune() {
    init_logging();
    let clock = ManualClock::new();
    let mut analyzer = Analyzer::new(&TunerConfig::default(), clock.clone()).unwrap();

    // The first full frame opens the gate and starts the attack window.
    let first = analyzer.process(&tone(110.0, 0.5, 0, 4096));
    assert_eq!(first, PipelineResult::NoObservation(Decline::AttackSuppressed));

    clock.advance_ms(100);
    let result = analyzer.process(&tone(110.0, 0.5, 4096, 4096));
    let observation = result.observation().expect("A2 observation");

    assert!(
        (observation.frequency_hz() - 110.0).abs() <= 1.1,
        "got {} Hz",
        observation.frequency_hz()
    );
    assert_eq!(observation.note_name(), "A2");
    assert!(observation.cents().abs() <= 5, "got {} cents", observation.cents());
}

#[test]
fn without_attack_window_first_frame_is_observed() {
    init_logging();
    let config = TunerConfig {
        attack_ignore_ms: 0,
        ..TunerConfig::default()
    };
    let mut analyzer = Analyzer::new(&config, ManualClock::new()).unwrap();
    let result = analyzer.process(&tone(110.0, 0.5, 0, 4096));
    assert_eq!(result.observation().map(|o| o.note_name()), Some("A2"));
}

#[test]
fn detuned_string_reports_cents() {
    init_logging();
    let config = TunerConfig {
        attack_ignore_ms: 0,
        ..TunerConfig::default()
    };
    let mut analyzer = Analyzer::new(&config, ManualClock::new()).unwrap();
    // 20 cents flat of G3.
    let freq = 196.0 * 2.0_f32.powf(-20.0 / 1200.0);
    let result = analyzer.process(&tone(freq, 0.5, 0, 4096));
    let observation = result.observation().expect("G3 observation");
    assert_eq!(observation.note_name(), "G3");
    assert!(
        (-25..=-15).contains(&observation.cents()),
        "got {} cents",
        observation.cents()
    );
}

#[test]
fn pluck_then_silence_holds_then_clears() {
    init_logging();
    let config = TunerConfig {
        attack_ignore_ms: 0,
        ..TunerConfig::default()
    };
    let clock = ManualClock::new();
    let mut analyzer = Analyzer::new(&config, clock.clone()).unwrap();
    let mut tracker = DisplayTracker::new(&config);

    // About 20 ms per 1024-sample chunk at 48 kHz.
    let mut offset = 0;
    let mut state = None;
    for _ in 0..8 {
        let result = analyzer.process(&tone(110.0, 0.5, offset, 1024));
        state = Some(tracker.update(clock.now(), &result));
        offset += 1024;
        clock.advance_ms(20);
    }
    let live = state.unwrap();
    assert_eq!(live.tier, SignalTier::Live);
    assert!(live.in_tune);

    // Silence closes the gate; the reading is held, then cleared.
    let mut tiers = Vec::new();
    for _ in 0..30 {
        let result = analyzer.process(&[0.0; 1024]);
        assert_eq!(result, PipelineResult::NoObservation(Decline::GateClosed));
        tiers.push(tracker.update(clock.now(), &result).tier);
        clock.advance_ms(20);
    }
    assert_eq!(tiers[0], SignalTier::Held);
    assert_eq!(*tiers.last().unwrap(), SignalTier::NoSignal);
    assert!(
        tiers.windows(2).all(|w| !(w[0] == SignalTier::NoSignal && w[1] == SignalTier::Held)),
        "hold must not come back without a new reading"
    );
}
