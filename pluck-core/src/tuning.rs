//! # Musical Tuning Module
//!
//! Maps frequencies to notes of 12-tone equal temperament referenced to
//! A4 = 440 Hz, with the deviation from the nearest note in cents.
//!
//! ## Features
//! - Closed-form nearest-note lookup, no table search
//! - Sharp note names with scientific octave numbers ("A2", "C#4")
//! - No clamping; display ranges are a presentation concern

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
const A4_MIDI: i32 = 69;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A frequency resolved to its nearest equal-tempered note.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteReading {
    /// Note name with octave, e.g. "A2".
    pub name: String,
    /// MIDI number of the nearest note (A4 = 69). May fall outside 0..=127.
    pub midi: i32,
    /// Frequency of the nearest note in Hz.
    pub target_frequency: f32,
    /// Deviation from the nearest note, rounded to whole cents.
    pub cents: i32,
}

/// Finds the nearest note to `freq` and the deviation in cents.
///
/// # Returns
/// * `Some(reading)` - For any positive, finite frequency
/// * `None` - For zero, negative, or non-finite input
pub fn nearest_note(freq: f32) -> Option<NoteReading> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }
    // f64 keeps the cents exact at the extremes of the audible range.
    let semitones = 12.0 * (freq as f64 / A4_FREQUENCY as f64).log2();
    let nearest = semitones.round();
    let cents = (100.0 * (semitones - nearest)).round() as i32;

    let midi = A4_MIDI + nearest as i32;
    Some(NoteReading {
        name: note_name(midi),
        midi,
        target_frequency: midi_to_frequency(midi),
        cents,
    })
}

/// Note name with octave for a MIDI number, e.g. 45 -> "A2".
pub fn note_name(midi: i32) -> String {
    let pitch_class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[pitch_class], octave)
}

/// Equal-tempered frequency of a MIDI note.
pub fn midi_to_frequency(midi: i32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Calculates the deviation from a target frequency in cents.
///
/// Positive values are sharp, negative values flat.
pub fn cents_between(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
