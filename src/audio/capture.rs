//! Audio capture from microphone

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};
use super::Recorder;
use super::clip::{AudioClip, CHUNK_SIZE, SAMPLE_RATE, chunk_aligned_len};

/// Records fixed-duration clips from the default input device
pub struct AudioCapture {
    device: Device,
    config: StreamConfig,
}

impl AudioCapture {
    /// Create a new audio capture instance
    ///
    /// # Errors
    ///
    /// Returns error if no input device supports 16kHz mono capture
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let supported_config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .ok_or_else(|| Error::Audio("no suitable input config found".to_string()))?;

        let config = supported_config
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            channels = config.channels,
            "audio capture initialized"
        );

        Ok(Self { device, config })
    }

    /// Record a clip of the given duration
    ///
    /// The stream is a scoped local, so the device is released on every exit
    /// path. The returned clip holds `chunk_aligned_len(duration)` samples:
    /// the partial final chunk is dropped.
    fn record_blocking(&self, duration_secs: u32) -> Result<AudioClip> {
        let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let callback_buffer = Arc::clone(&buffer);

        let stream = self
            .device
            .build_input_stream(
                &self.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = callback_buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio capture error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;
        tracing::info!(duration_secs, "recording");

        std::thread::sleep(Duration::from_secs(u64::from(duration_secs)));
        drop(stream);

        let raw = buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        // Convert f32 [-1.0, 1.0] to i16 and trim to whole chunks
        #[allow(clippy::cast_possible_truncation)]
        let mut samples: Vec<i16> = raw
            .iter()
            .map(|&s| (s * 32767.0).clamp(-32768.0, 32767.0) as i16)
            .collect();

        samples.truncate(chunk_aligned_len(duration_secs, SAMPLE_RATE));
        let aligned = samples.len() - samples.len() % CHUNK_SIZE;
        samples.truncate(aligned);

        tracing::info!(samples = samples.len(), "recording finished");

        let mut clip = AudioClip::new(samples, SAMPLE_RATE, self.config.channels);
        let spool_path = clip.spool()?;
        tracing::debug!(path = %spool_path.display(), "clip spooled");

        Ok(clip)
    }
}

#[async_trait::async_trait]
impl Recorder for AudioCapture {
    #[allow(clippy::unused_async)]
    async fn record(&mut self, duration_secs: u32) -> Result<AudioClip> {
        self.record_blocking(duration_secs)
    }
}
