//! # Audio Capture Module
//!
//! This module defines the [`AudioSource`] collaborator the session pulls
//! chunks from, and its real-time implementation on top of CPAL
//! (Cross-Platform Audio Library).
//!
//! ## Features
//! - Automatic selection of the default input device
//! - f32 input at the requested rate, clamped into what the device supports
//! - Interleaved multi-channel input downmixed to mono in the callback
//! - Idempotent stop that releases the device deterministically

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, Sender};

use crate::error::CaptureError;

/// Number of chunks buffered between the audio callback and the analysis
/// thread before new chunks are dropped.
pub const CHUNK_QUEUE_DEPTH: usize = 64;

/// One delivery from an audio source.
pub type ChunkResult = Result<Vec<f32>, CaptureError>;

/// A start/stop stream of mono sample chunks at a fixed rate.
pub trait AudioSource {
    /// Rate of the delivered samples in Hz.
    fn sample_rate(&self) -> u32;

    /// Starts capture. Chunks arrive in order on the returned receiver.
    fn start(&mut self) -> Result<Receiver<ChunkResult>, CaptureError>;

    /// Stops capture and releases the device.
    ///
    /// Safe to call repeatedly. No chunk is delivered after it returns.
    fn stop(&mut self);
}

/// Captures from the default input device through CPAL.
pub struct CpalSource {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
}

impl CpalSource {
    /// Opens the default input device, asking for `requested_rate` Hz.
    pub fn open_default(requested_rate: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceInit("No input device available".into()))?;

        match device.name() {
            Ok(name) => log::info!("Using audio input device: {}", name),
            Err(e) => log::warn!("Could not read input device name: {}", e),
        }

        let configs = device
            .supported_input_configs()
            .map_err(|e| classify(e.to_string()))?
            .collect::<Vec<_>>();
        let supported = find_supported_config(configs, requested_rate)
            .ok_or_else(|| CaptureError::DeviceInit("No suitable f32 input format found".into()))?;

        let rate = requested_rate.clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
        let config: cpal::StreamConfig = supported.with_sample_rate(SampleRate(rate)).into();
        log::info!(
            "Selected {} Hz with {} channel(s)",
            config.sample_rate.0,
            config.channels
        );

        Ok(Self {
            device,
            config,
            stream: None,
        })
    }
}

impl AudioSource for CpalSource {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn start(&mut self) -> Result<Receiver<ChunkResult>, CaptureError> {
        // Restarting replaces the old stream.
        self.stop();

        let (tx, rx) = crossbeam_channel::bounded(CHUNK_QUEUE_DEPTH);
        let channels = usize::from(self.config.channels.max(1));
        let error_tx: Sender<ChunkResult> = tx.clone();

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Dropping a chunk when the analysis thread lags is fine.
                    let _ = tx.try_send(Ok(downmix(data, channels)));
                },
                move |err| {
                    let _ = error_tx.try_send(Err(CaptureError::TransientRead(err.to_string())));
                },
                None,
            )
            .map_err(|e| classify(e.to_string()))?;
        stream.play().map_err(|e| classify(e.to_string()))?;

        self.stream = Some(stream);
        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            log::info!("Stopping audio stream");
            if let Err(e) = stream.pause() {
                log::warn!("Error pausing stream: {}", e);
            }
            // Dropping the stream closes the device and the chunk sender.
            drop(stream);
        }
    }
}

impl Drop for CpalSource {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Finds the best supported configuration for the target sample rate.
///
/// f32 only. Mono is preferred, then the range closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let rate_distance = if (min..=max).contains(&target_rate) {
                0
            } else {
                target_rate.abs_diff(min).min(target_rate.abs_diff(max))
            };
            (c.channels() != 1, rate_distance)
        })
}

/// Averages interleaved frames down to one channel.
pub fn downmix(data: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    data.chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Maps a backend error description onto the capture taxonomy.
///
/// Backends report missing microphone authorization only as text.
fn classify(description: String) -> CaptureError {
    let lower = description.to_lowercase();
    let denied = ["permission", "denied", "not authorized", "unauthorized"]
        .iter()
        .any(|needle| lower.contains(needle));
    if denied {
        CaptureError::PermissionDenied
    } else {
        CaptureError::DeviceInit(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_interleaved_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5, 0.0]);
        assert_eq!(downmix(&stereo, 1), stereo.to_vec());
    }

    #[test]
    fn downmix_drops_incomplete_trailing_frame() {
        assert_eq!(downmix(&[0.25, 0.75, 0.5, 1.0, 1.0], 2), vec![0.5, 0.75]);
    }

    #[test]
    fn classify_permission_errors() {
        assert!(matches!(
            classify("Access denied by the operating system".into()),
            CaptureError::PermissionDenied
        ));
        assert!(matches!(
            classify("A backend-specific error has occurred: device busy".into()),
            CaptureError::DeviceInit(_)
        ));
    }
}
