//! # Musical Tuning Module
//!
//! This module provides the musical side of the tuner: converting detected
//! frequencies to equal-tempered note names and measuring how far a played
//! pitch sits from a user-selected target note.
//!
//! ## Features
//! - MIDI-based frequency to note mapping (A4 = 440 Hz)
//! - Signed cents offsets (positive = sharp, negative = flat)
//! - Target note comparison by letter class, octave agnostic
//! - Accuracy banding for display layers

use serde::Serialize;
use std::fmt;

/// The twelve chromatic letter classes, indexed by MIDI pitch class
/// (0 = C, 1 = C#, ..., 11 = B).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A single equal-tempered note: a chromatic letter class plus an octave
/// number derived from the MIDI note index (A4 = MIDI 69 = octave 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteName {
    /// Letter class, one of [`NOTE_NAMES`].
    pub letter: &'static str,
    /// Octave number (C4 is middle C).
    pub octave: i32,
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.letter, self.octave)
    }
}

/// The outcome of comparing a detected note against the target note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TuningResult {
    /// The nearest equal-tempered note to the detected frequency.
    pub note: NoteName,
    /// Signed cents residual from that nearest note, roughly [-50, 50).
    pub cents_offset_from_note: i32,
    /// Whether the detected letter class equals the target letter class.
    pub matches_target: bool,
    /// Cents offset against the target; forced to 0 when the letter
    /// classes differ ("wrong note" carries no directional offset).
    pub cents_offset_from_target: i32,
}

/// How close a matching note is to the target, in coarse display bands.
///
/// The display layer relies on these thresholds and on the sign
/// convention of the underlying cents offset (positive = sharp).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Accuracy {
    /// Within 5 cents of the target.
    InTune,
    /// Within 15 cents.
    VeryClose,
    /// Within 30 cents.
    Close,
    /// Anything further off.
    Off,
}

impl Accuracy {
    /// Classifies an absolute cents offset into a display band.
    pub fn from_cents(cents: i32) -> Self {
        match cents.abs() {
            0..=4 => Accuracy::InTune,
            5..=14 => Accuracy::VeryClose,
            15..=29 => Accuracy::Close,
            _ => Accuracy::Off,
        }
    }
}

impl TuningResult {
    /// Display band for this result's offset from the target.
    pub fn accuracy(&self) -> Accuracy {
        Accuracy::from_cents(self.cents_offset_from_target)
    }
}

/// Returns true if `letter` is one of the twelve chromatic letter classes.
pub fn is_note_letter(letter: &str) -> bool {
    NOTE_NAMES.contains(&letter)
}

/// Rounds half-values toward positive infinity, so a pitch exactly
/// between two semitones maps to the higher note.
fn round_half_up(value: f32) -> i32 {
    (value + 0.5).floor() as i32
}

/// Finds the nearest equal-tempered note to a frequency.
///
/// Uses the standard logarithmic MIDI mapping with A4 = 440 Hz at MIDI
/// note 69. The residual is returned as a signed cents offset from the
/// nearest note (100 cents per semitone), so it stays within roughly
/// half a semitone in either direction. Pitch class and octave are
/// taken with euclidean division so MIDI numbers below zero still map
/// to valid letters.
///
/// The input must be a positive frequency; the pitch estimator
/// guarantees this for every detection it reports.
///
/// # Arguments
/// * `frequency` - Input frequency in Hz (> 0)
///
/// # Returns
/// * `(note, cents_offset)` - Nearest note and signed cents residual
pub fn closest_note(frequency: f32) -> (NoteName, i32) {
    // Continuous MIDI note number on the logarithmic pitch scale.
    let note_number = 12.0 * (frequency / 440.0).log2() + 69.0;
    let nearest = round_half_up(note_number);
    let cents = round_half_up((note_number - nearest as f32) * 100.0);

    let note = NoteName {
        letter: NOTE_NAMES[nearest.rem_euclid(12) as usize],
        octave: nearest.div_euclid(12) - 1,
    };
    (note, cents)
}

/// Compares a detected note against the selected target letter class.
///
/// The comparison ignores octaves: playing A3 against target "A" counts
/// as a match. On a match the cents residual from the nearest note *is*
/// the offset from the target, so it carries through; on a mismatch the
/// tuner reports "wrong note" rather than a misleading numeric offset.
///
/// # Arguments
/// * `note` - Detected note from [`closest_note`]
/// * `cents_offset_from_note` - Residual from [`closest_note`]
/// * `target_letter` - Target letter class, one of [`NOTE_NAMES`]
///
/// # Returns
/// * `TuningResult` - Match flag and signed offset against the target
pub fn evaluate_target(
    note: NoteName,
    cents_offset_from_note: i32,
    target_letter: &str,
) -> TuningResult {
    let matches_target = note.letter == target_letter;
    TuningResult {
        note,
        cents_offset_from_note,
        matches_target,
        cents_offset_from_target: if matches_target {
            cents_offset_from_note
        } else {
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_reference_pitches_map_cleanly() {
        let cases = [
            (440.0, "A", 4),
            (880.0, "A", 5),
            (466.16, "A#", 4),
            (261.63, "C", 4),
        ];
        for (frequency, letter, octave) in cases {
            let (note, cents) = closest_note(frequency);
            assert_eq!(note.letter, letter, "{frequency} Hz");
            assert_eq!(note.octave, octave, "{frequency} Hz");
            assert_eq!(cents, 0, "{frequency} Hz should have no residual");
        }
    }

    #[test]
    fn cents_sign_follows_frequency_direction() {
        let (note, sharp_cents) = closest_note(445.0);
        assert_eq!(note.to_string(), "A4");
        assert!(sharp_cents > 0);

        let (note, flat_cents) = closest_note(435.0);
        assert_eq!(note.to_string(), "A4");
        assert!(flat_cents < 0);
    }

    #[test]
    fn cents_residual_stays_within_half_a_semitone() {
        let mut frequency = 66.0;
        while frequency < 1200.0 {
            let (_, cents) = closest_note(frequency);
            assert!((-50..=50).contains(&cents), "{frequency} Hz gave {cents}");
            frequency += 7.3;
        }
    }

    #[test]
    fn negative_midi_numbers_map_to_valid_letters() {
        // 7 Hz sits below MIDI 0; euclidean arithmetic must still
        // produce a chromatic letter rather than panicking.
        let (note, _) = closest_note(7.0);
        assert!(is_note_letter(note.letter));
        assert!(note.octave < 0);
    }

    #[test]
    fn matching_target_carries_cents_through() {
        let (note, cents) = closest_note(445.0);
        let result = evaluate_target(note, cents, "A");
        assert!(result.matches_target);
        assert_eq!(result.cents_offset_from_target, cents);
    }

    #[test]
    fn mismatched_target_zeroes_the_offset() {
        // C4, deliberately a few cents sharp.
        let (note, cents) = closest_note(262.5);
        assert_eq!(note.to_string(), "C4");
        assert_ne!(cents, 0);

        let result = evaluate_target(note, cents, "A");
        assert!(!result.matches_target);
        assert_eq!(result.cents_offset_from_target, 0);
        assert_eq!(result.cents_offset_from_note, cents);
    }

    #[test]
    fn accuracy_bands_match_display_contract() {
        assert_eq!(Accuracy::from_cents(0), Accuracy::InTune);
        assert_eq!(Accuracy::from_cents(-4), Accuracy::InTune);
        assert_eq!(Accuracy::from_cents(5), Accuracy::VeryClose);
        assert_eq!(Accuracy::from_cents(-14), Accuracy::VeryClose);
        assert_eq!(Accuracy::from_cents(15), Accuracy::Close);
        assert_eq!(Accuracy::from_cents(29), Accuracy::Close);
        assert_eq!(Accuracy::from_cents(30), Accuracy::Off);
        assert_eq!(Accuracy::from_cents(-50), Accuracy::Off);
    }

    #[test]
    fn note_names_display_with_octave() {
        let (note, _) = closest_note(277.18);
        assert_eq!(note.to_string(), "C#4");
    }
}
