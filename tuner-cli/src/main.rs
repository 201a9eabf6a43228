//! # Symphoni Tuner CLI
//!
//! Terminal front end for the tuner core. This is the host-driven
//! sampling loop: a CPAL stream captures microphone frames on the audio
//! thread, a crossbeam channel carries them here, and each frame is
//! analyzed synchronously and rendered as a live single-line meter (or
//! as JSON lines for machine consumers).
//!
//! ## Architecture
//! - **Audio thread**: CPAL stream callback producing 4096-sample frames
//! - **Main thread**: per-frame analysis and terminal rendering
//! - **Communication**: bounded crossbeam channel, frames dropped when behind

use anyhow::{Result, bail};
use clap::Parser;
use crossbeam_channel::bounded;
use std::io::Write;
use tuner_core::{AnalysisResult, audio, estimate_pitch, tuning};

/// Width of the cents meter in character cells (one cell per 5 cents).
const METER_WIDTH: usize = 21;

/// Input level below which the meter hints at playing louder.
const QUIET_VOLUME: f32 = 5.0;

/// tuner - Real-time instrument tuner
///
/// Listens on the default microphone, detects the fundamental pitch of
/// whatever is being played, and shows how many cents sharp or flat it
/// is relative to the selected target note.
#[derive(Parser, Debug)]
#[command(name = "tuner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Target note letter (C, C#, D, D#, E, F, F#, G, G#, A, A#, B)
    #[arg(short, long, default_value = "A")]
    note: String,

    /// Preferred capture sample rate in Hz
    #[arg(long, value_name = "HZ", default_value_t = 44100)]
    sample_rate: u32,

    /// Emit one JSON object per analysis frame instead of the live meter
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if !tuning::is_note_letter(&cli.note) {
        bail!(
            "unknown note letter {:?} (expected one of {})",
            cli.note,
            tuning::NOTE_NAMES.join(", ")
        );
    }

    eprintln!("[MAIN] Starting tuner, target note {}", cli.note);

    let (sender, receiver) = bounded::<Vec<f32>>(8);
    let (_stream, sample_rate) = audio::start_capture(sender, cli.sample_rate)?;

    eprintln!("[MAIN] Listening at {} Hz, press Ctrl-C to stop", sample_rate);

    // The loop ends only if the capture stream dies and the channel
    // disconnects; normal shutdown is Ctrl-C.
    for frame in receiver {
        let analysis = estimate_pitch(&frame, sample_rate, &cli.note)?;

        if cli.json {
            println!("{}", serde_json::to_string(&analysis)?);
        } else {
            render_meter(&frame, &analysis, &cli.note)?;
        }
    }

    Ok(())
}

/// Scales the frame's RMS level to a 0-100 volume figure for the meter.
fn input_volume(frame: &[f32]) -> f32 {
    let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt();
    // Amplified so quiet playing still registers visibly.
    (rms * 100.0 * 5.0).clamp(0.0, 100.0)
}

/// Draws the live meter line in place:
/// note name, frequency, cents strip, and a feedback message.
fn render_meter(frame: &[f32], analysis: &AnalysisResult, target: &str) -> Result<()> {
    let volume = input_volume(frame);

    let (note_field, freq_field) = match (&analysis.note, analysis.detected_frequency) {
        (Some(note), Some(frequency)) => (note.to_string(), format!("{frequency:6.1} Hz")),
        _ => ("-".to_string(), "      -   ".to_string()),
    };

    let line = format!(
        "{:4} {} [{}] {}",
        note_field,
        freq_field,
        cents_strip(analysis),
        feedback(analysis, target, volume),
    );

    let mut stdout = std::io::stdout().lock();
    // Pad so a shorter line fully overwrites the previous one.
    write!(stdout, "\r{line:<78}")?;
    stdout.flush()?;
    Ok(())
}

/// Renders the cents offset as a needle on a fixed-width strip,
/// spanning -50 to +50 cents with the target at the center.
fn cents_strip(analysis: &AnalysisResult) -> String {
    let mut cells = vec!['-'; METER_WIDTH];
    cells[METER_WIDTH / 2] = '+';

    if analysis.matches_target == Some(true) {
        if let Some(cents) = analysis.cents_offset_from_target {
            let span = (METER_WIDTH - 1) as f32;
            let position = ((cents + 50) as f32 / 100.0 * span).round() as usize;
            cells[position.min(METER_WIDTH - 1)] = '|';
        }
    }

    cells.into_iter().collect()
}

/// Mirrors the tuner's on-screen feedback policy: quiet input, no
/// stable pitch, wrong note, then sharp/flat distance in cents.
fn feedback(analysis: &AnalysisResult, target: &str, volume: f32) -> String {
    if volume < QUIET_VOLUME && !analysis.detected() {
        return "No sound detected. Try playing louder".to_string();
    }

    let Some(cents) = analysis.cents_offset_from_target else {
        return "Play a clear, sustained note...".to_string();
    };

    if analysis.matches_target != Some(true) {
        return format!("Play {target}");
    }

    match tuning::Accuracy::from_cents(cents) {
        tuning::Accuracy::InTune => "Perfect!".to_string(),
        _ if cents > 0 => format!("Sharp by {} cents", cents.abs()),
        _ => format!("Flat by {} cents", cents.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuner_core::tuning::{closest_note, evaluate_target};

    fn analysis_for(frequency: f32, target: &str) -> AnalysisResult {
        let (note, cents) = closest_note(frequency);
        let result = evaluate_target(note, cents, target);
        AnalysisResult {
            detected_frequency: Some(frequency),
            note: Some(result.note),
            cents_offset_from_note: Some(result.cents_offset_from_note),
            matches_target: Some(result.matches_target),
            cents_offset_from_target: Some(result.cents_offset_from_target),
        }
    }

    #[test]
    fn feedback_reports_sharp_and_flat_direction() {
        assert_eq!(feedback(&analysis_for(445.0, "A"), "A", 50.0), "Sharp by 20 cents");
        assert_eq!(feedback(&analysis_for(435.0, "A"), "A", 50.0), "Flat by 20 cents");
        assert_eq!(feedback(&analysis_for(440.0, "A"), "A", 50.0), "Perfect!");
    }

    #[test]
    fn feedback_asks_for_the_target_note_on_mismatch() {
        assert_eq!(feedback(&analysis_for(261.63, "A"), "A", 50.0), "Play A");
    }

    #[test]
    fn needle_sits_centered_when_in_tune() {
        let strip = cents_strip(&analysis_for(440.0, "A"));
        assert_eq!(strip.chars().nth(METER_WIDTH / 2), Some('|'));
    }

    #[test]
    fn needle_is_hidden_for_non_matching_notes() {
        let strip = cents_strip(&analysis_for(261.63, "A"));
        assert!(!strip.contains('|'));
    }
}
