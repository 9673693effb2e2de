//! Audio playback to speakers

use std::path::Path;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};
use super::Player;

/// Plays WAV containers through the default output device
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Create a new audio playback instance
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Decode a WAV container and stream it until exhausted
    ///
    /// No mid-stream cancellation: the call blocks until the samples run out.
    fn play_blocking(&self, path: &Path) -> Result<()> {
        let (samples, sample_rate) = decode_wav(path)?;
        if samples.is_empty() {
            return Ok(());
        }

        let config = self.output_config(sample_rate)?;
        let channels = config.channels as usize;

        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(Mutex::new(false));

        let stream_samples = samples.clone();
        let stream_position = Arc::clone(&position);
        let stream_finished = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut pos = match stream_position.lock() {
                        Ok(pos) => pos,
                        Err(_) => return,
                    };

                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < stream_samples.len() {
                            stream_samples[*pos]
                        } else {
                            if let Ok(mut done) = stream_finished.lock() {
                                *done = true;
                            }
                            0.0
                        };

                        for out in frame.iter_mut() {
                            *out = sample;
                        }

                        if *pos < stream_samples.len() {
                            *pos += 1;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion, bounded by the clip duration plus slack
        let duration_ms = (samples.len() as u64 * 1000) / u64::from(sample_rate);
        let timeout = std::time::Duration::from_millis(duration_ms + 500);
        let start = std::time::Instant::now();

        while !finished.lock().map(|done| *done).unwrap_or(true) {
            if start.elapsed() > timeout {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        std::thread::sleep(std::time::Duration::from_millis(100));
        drop(stream);

        tracing::debug!(samples = samples.len(), "playback complete");
        Ok(())
    }

    /// Find an output config matching the container's sample rate
    fn output_config(&self, sample_rate: u32) -> Result<StreamConfig> {
        let supported = self
            .device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .or_else(|| {
                // Fallback: try stereo
                self.device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(sample_rate)
                        && c.max_sample_rate() >= SampleRate(sample_rate)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        Ok(supported.with_sample_rate(SampleRate(sample_rate)).config())
    }
}

#[async_trait::async_trait]
impl Player for AudioPlayback {
    #[allow(clippy::unused_async)]
    async fn play(&mut self, path: &Path) -> Result<()> {
        self.play_blocking(path)
    }
}

/// Decode a WAV file to mono f32 samples
fn decode_wav(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path).map_err(|e| Error::Audio(e.to_string()))?;
    let spec = reader.spec();

    let raw: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Audio(e.to_string()))?;

    let samples: Vec<f32> = if spec.channels == 2 {
        // Stereo: average channels
        raw.chunks(2)
            .map(|chunk| {
                let left = f32::from(chunk[0]) / 32768.0;
                let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                f32::midpoint(left, right)
            })
            .collect()
    } else {
        raw.iter().map(|&s| f32::from(s) / 32768.0).collect()
    };

    Ok((samples, spec.sample_rate))
}
