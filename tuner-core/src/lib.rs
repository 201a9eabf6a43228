// tuner-core/src/lib.rs

//! The core logic for the instrument tuner.
//! This crate is responsible for audio capture, pitch detection,
//! and tuning evaluation against a target note. It is completely
//! headless and contains no display code.

pub mod audio;
pub mod pitch;
pub mod tuning;

use anyhow::{Result, ensure};
use serde::Serialize;

use tuning::NoteName;

/// Represents the result of a single audio analysis frame.
///
/// Every field is `None` when no confident pitch was found in the
/// frame; "no pitch" is a normal state for the display layer, not an
/// error. The struct serializes directly for machine-readable hosts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// The detected fundamental frequency in Hz.
    pub detected_frequency: Option<f32>,
    /// The nearest equal-tempered note to the detected frequency.
    pub note: Option<NoteName>,
    /// Signed cents residual from the nearest note.
    pub cents_offset_from_note: Option<i32>,
    /// Whether the detected letter class matches the target note.
    pub matches_target: Option<bool>,
    /// Signed cents offset against the target (0 on a letter mismatch).
    pub cents_offset_from_target: Option<i32>,
}

impl AnalysisResult {
    /// True when the frame contained a confident pitch.
    pub fn detected(&self) -> bool {
        self.detected_frequency.is_some()
    }

    fn no_pitch() -> Self {
        AnalysisResult {
            detected_frequency: None,
            note: None,
            cents_offset_from_note: None,
            matches_target: None,
            cents_offset_from_target: None,
        }
    }
}

/// Analyzes one buffer of audio against a target note.
///
/// This is the single synchronous boundary the host calls once per
/// captured frame: pitch estimation, note mapping, and target
/// evaluation run back to back and produce a display-ready result.
/// The call is stateless, so hosts may invoke it from any thread as
/// long as each call gets its own buffer.
///
/// # Arguments
/// * `samples` - One frame of mono audio samples in [-1, 1]
/// * `sample_rate` - Sample rate of the frame in Hz
/// * `target_letter` - Target letter class, one of [`tuning::NOTE_NAMES`]
///
/// # Returns
/// * `Ok(result)` - Analysis for this frame (possibly "no pitch")
/// * `Err(e)` - Empty buffer, zero sample rate, or unknown target letter
pub fn estimate_pitch(
    samples: &[f32],
    sample_rate: u32,
    target_letter: &str,
) -> Result<AnalysisResult> {
    ensure!(
        tuning::is_note_letter(target_letter),
        "unknown target note letter: {target_letter:?}"
    );

    let Some(frequency) = pitch::detect_pitch(samples, sample_rate)? else {
        return Ok(AnalysisResult::no_pitch());
    };

    let (note, cents_offset) = tuning::closest_note(frequency);
    let result = tuning::evaluate_target(note, cents_offset, target_letter);

    Ok(AnalysisResult {
        detected_frequency: Some(frequency),
        note: Some(result.note),
        cents_offset_from_note: Some(result.cents_offset_from_note),
        matches_target: Some(result.matches_target),
        cents_offset_from_target: Some(result.cents_offset_from_target),
    })
}
