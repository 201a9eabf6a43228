//! # Audio Capture Module
//!
//! Real-time microphone capture via CPAL. The tuner core itself never
//! owns an audio device; this module is the capability a host wires in
//! to feed fixed-size frames to [`crate::estimate_pitch`].
//!
//! ## Features
//! - Default input device selection with mono f32 streams
//! - Caller-chosen target sample rate (44.1 kHz by convention)
//! - Fixed-size frame accumulation inside the stream callback
//! - Non-blocking hand-off over a crossbeam channel

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;

/// Number of samples per analysis frame.
///
/// 4096 samples at 44.1 kHz is roughly 93 ms of audio, long enough to
/// hold several periods of the lowest detectable pitch while keeping
/// the meter responsive.
pub const BUFFER_SIZE: usize = 4096;

/// Starts audio capture from the default input device.
///
/// Opens a mono f32 stream as close as possible to `target_rate`,
/// accumulates samples in the stream callback, and pushes one
/// [`BUFFER_SIZE`]-sample frame at a time to `sender`. Frames are sent
/// with `try_send`, so a slow consumer drops frames instead of
/// stalling the audio callback.
///
/// The returned stream must be kept alive for capture to continue;
/// dropping it stops the microphone.
///
/// # Arguments
/// * `sender` - Channel sender for streaming frames to the analysis loop
/// * `target_rate` - Preferred sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Live stream handle and the actual rate
/// * `Err(e)` - No usable input device or configuration
pub fn start_capture(sender: Sender<Vec<f32>>, target_rate: u32) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("no audio input device available"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_input_config(configs, target_rate)
        .ok_or_else(|| anyhow!("no suitable mono f32 input format found"))?;

    let sample_rate = target_rate
        .clamp(
            supported_config.min_sample_rate().0,
            supported_config.max_sample_rate().0,
        );
    let config = supported_config.with_sample_rate(cpal::SampleRate(sample_rate));
    let config: cpal::StreamConfig = config.into();

    eprintln!("[AUDIO] Capturing at {} Hz", sample_rate);

    let err_fn = |err| eprintln!("[AUDIO] Stream error: {}", err);

    // Accumulates callback data until a full analysis frame is ready.
    let mut frame_buffer = Vec::with_capacity(BUFFER_SIZE * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            frame_buffer.extend_from_slice(data);

            while frame_buffer.len() >= BUFFER_SIZE {
                let frame = frame_buffer[..BUFFER_SIZE].to_vec();

                // Drop the frame if the analysis loop is behind.
                let _ = sender.try_send(frame);

                frame_buffer.drain(..BUFFER_SIZE);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the input configuration whose supported rate range sits
/// closest to the target rate, restricted to mono f32 formats.
fn find_input_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i64 - target_rate as i64).abs();
            let max_diff = (c.max_sample_rate().0 as i64 - target_rate as i64).abs();
            min_diff.min(max_diff)
        })
}
