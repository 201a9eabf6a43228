//! # Pitch Detection Module
//!
//! This module implements the real-time pitch detection used by the tuner.
//! It provides autocorrelation-based fundamental frequency estimation on
//! time-domain audio buffers, using a YIN-inspired normalized difference
//! function.
//!
//! ## Features
//! - YIN-style cumulative mean normalized difference function
//! - Silence gating on total signal energy
//! - First-dip period selection to avoid octave errors
//! - Musical range limiting (65 Hz to 1200 Hz)

use anyhow::{Result, ensure};

/// Normalized-difference cutoff for period candidates.
/// Lower values make detection more selective; 0.12 keeps the tuner
/// sensitive to softly played notes.
pub const DIP_THRESHOLD: f32 = 0.12;

/// Lowest detectable frequency in Hz (roughly low C on a guitar or cello).
pub const MIN_FREQUENCY: f32 = 65.0;

/// Highest detectable frequency in Hz (roughly high flute range).
pub const MAX_FREQUENCY: f32 = 1200.0;

/// Total-energy floor below which a buffer is treated as silence.
const SILENCE_ENERGY: f32 = 0.005;

/// Estimates the fundamental frequency of a block of audio samples.
///
/// The detector is pure and stateless: each call depends only on the
/// buffer and sample rate it is given, so repeated calls with the same
/// input produce identical results.
///
/// The algorithm:
/// 1. Gate on total signal energy to reject silence and noise floor.
/// 2. Compute the squared-difference function for every lag up to the
///    period of [`MIN_FREQUENCY`].
/// 3. Normalize with the YIN cumulative mean so values are comparable
///    across lags.
/// 4. Scan for the first lag whose normalized difference drops below
///    [`DIP_THRESHOLD`], then walk forward to that dip's local minimum.
///    Stopping at the first dip privileges the shortest matching period
///    (the true fundamental) over longer sub-harmonic lags. The scan
///    deliberately does not compare dips across the whole range, which
///    trades a little accuracy on shallow first dips for octave-error
///    resistance.
/// 5. Reject periods that fall outside the musical range.
///
/// # Arguments
/// * `signal` - Input audio samples in the range [-1, 1]
/// * `sample_rate` - Sample rate in Hz
///
/// # Returns
/// * `Ok(Some(frequency))` - Detected fundamental frequency in Hz
/// * `Ok(None)` - No confident pitch (silence, noise, or out of range)
/// * `Err(e)` - Precondition violation (empty buffer or zero sample rate)
pub fn detect_pitch(signal: &[f32], sample_rate: u32) -> Result<Option<f32>> {
    ensure!(!signal.is_empty(), "audio buffer must not be empty");
    ensure!(sample_rate > 0, "sample rate must be positive");

    // Largest lag worth searching, set by the lowest frequency of interest.
    let max_period = (sample_rate as f32 / MIN_FREQUENCY).floor() as usize;
    if max_period < 3 {
        // Sample rate too low to fit even the shortest searchable lag.
        return Ok(None);
    }

    // --- Noise gate: total energy of the buffer ---
    let energy: f32 = signal.iter().map(|&s| s * s).sum();
    if energy < SILENCE_ENERGY {
        return Ok(None);
    }

    // --- Step 1: Squared difference for each lag ---
    // Lags longer than the buffer simply contribute no terms.
    let mut differences = vec![0.0f32; max_period];
    for lag in 1..max_period {
        let mut square_diff = 0.0;
        for i in 0..signal.len().saturating_sub(lag) {
            let delta = signal[i] - signal[i + lag];
            square_diff += delta * delta;
        }
        differences[lag] = square_diff;
    }

    // --- Step 2: Cumulative mean normalization ---
    // Lag 0 is a sentinel so it can never be picked as the best period.
    differences[0] = 1.0;
    let mut running_sum = 0.0;
    for lag in 1..max_period {
        running_sum += differences[lag];
        if running_sum != 0.0 {
            differences[lag] *= lag as f32 / running_sum;
        } else {
            // A flat (DC) signal zeroes every difference; leave the
            // sentinel value so no dip is ever found.
            differences[lag] = 1.0;
        }
    }

    // --- Step 3: First dip below threshold, then its local minimum ---
    let mut best_period = 0usize;
    let mut lag = 2;
    while lag < max_period {
        if differences[lag] < DIP_THRESHOLD {
            let mut local_min = lag;
            while lag + 1 < max_period && differences[lag + 1] < differences[lag] {
                lag += 1;
                if differences[lag] < differences[local_min] {
                    local_min = lag;
                }
            }
            best_period = local_min;
            break;
        }
        lag += 1;
    }

    if best_period == 0 {
        return Ok(None);
    }

    // --- Step 4: Period to frequency, bounded to the musical range ---
    let frequency = sample_rate as f32 / best_period as f32;
    if (MIN_FREQUENCY..=MAX_FREQUENCY).contains(&frequency) {
        Ok(Some(frequency))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: u32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| {
                (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn silence_yields_no_pitch() {
        let buffer = vec![0.0; 4096];
        assert_eq!(detect_pitch(&buffer, 44100).unwrap(), None);
    }

    #[test]
    fn short_silent_buffer_yields_no_pitch() {
        let buffer = vec![0.0; 64];
        assert_eq!(detect_pitch(&buffer, 44100).unwrap(), None);
    }

    #[test]
    fn dc_signal_yields_no_pitch() {
        // Passes the energy gate but has no periodicity to find.
        let buffer = vec![0.5; 4096];
        assert_eq!(detect_pitch(&buffer, 44100).unwrap(), None);
    }

    #[test]
    fn sine_round_trip_within_two_percent() {
        for &frequency in &[220.0f32, 440.0, 880.0] {
            let buffer = sine(frequency, 44100, 4096);
            let detected = detect_pitch(&buffer, 44100)
                .unwrap()
                .unwrap_or_else(|| panic!("no pitch detected for {frequency} Hz sine"));
            let relative_error = (detected - frequency).abs() / frequency;
            assert!(
                relative_error < 0.02,
                "{frequency} Hz sine detected as {detected} Hz"
            );
        }
    }

    #[test]
    fn out_of_range_frequencies_are_rejected() {
        // Periodic and loud, but outside the 65-1200 Hz acceptance window.
        for &frequency in &[30.0f32, 2000.0] {
            let buffer = sine(frequency, 44100, 4096);
            assert_eq!(
                detect_pitch(&buffer, 44100).unwrap(),
                None,
                "{frequency} Hz should be rejected"
            );
        }
    }

    #[test]
    fn detection_is_idempotent() {
        let buffer = sine(440.0, 44100, 4096);
        let first = detect_pitch(&buffer, 44100).unwrap();
        let second = detect_pitch(&buffer, 44100).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_buffer_is_an_error() {
        assert!(detect_pitch(&[], 44100).is_err());
    }

    #[test]
    fn zero_sample_rate_is_an_error() {
        let buffer = sine(440.0, 44100, 4096);
        assert!(detect_pitch(&buffer, 0).is_err());
    }
}
