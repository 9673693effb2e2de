//! PCM audio clips and WAV containers

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Sample rate for speech capture (16kHz)
pub const SAMPLE_RATE: u32 = 16000;

/// Frames read from the input device per chunk
///
/// Capture length is truncated to a whole number of chunks; a partial final
/// chunk is dropped.
pub const CHUNK_SIZE: usize = 1024;

/// Number of samples captured for a given duration
///
/// `floor(duration * sample_rate / CHUNK_SIZE)` whole chunks.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn chunk_aligned_len(duration_secs: u32, sample_rate: u32) -> usize {
    // Widened before multiplying: u32 * u32 overflows for very long durations
    let total = (duration_secs as u64 * sample_rate as u64) as usize;
    (total / CHUNK_SIZE) * CHUNK_SIZE
}

/// A recorded audio clip: 16-bit PCM samples plus format metadata
///
/// Created by capture and consumed by value by the transcriber. If the clip
/// was spooled to a temporary WAV container, that file is deleted when the
/// clip drops, whatever happened to the transcription.
#[derive(Debug)]
pub struct AudioClip {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    spool: Option<NamedTempFile>,
}

impl AudioClip {
    /// Create a clip from raw samples
    #[must_use]
    pub const fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
            spool: None,
        }
    }

    /// Raw PCM samples
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample rate in Hz
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Clip length in seconds
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / (f64::from(self.sample_rate) * f64::from(self.channels))
    }

    /// Encode the clip as WAV container bytes
    ///
    /// # Errors
    ///
    /// Returns error if WAV encoding fails
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        encode_wav(&self.samples, self.sample_rate, self.channels)
    }

    /// Write the clip to a temporary WAV container owned by the clip
    ///
    /// The file is deleted when the clip drops.
    ///
    /// # Errors
    ///
    /// Returns error if the container cannot be written
    pub fn spool(&mut self) -> Result<&Path> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&self.to_wav_bytes()?)?;
        file.flush()?;
        Ok(self.spool.insert(file).path())
    }

    /// Path of the spooled container, if one was written
    #[must_use]
    pub fn spool_path(&self) -> Option<&Path> {
        self.spool.as_ref().map(NamedTempFile::path)
    }
}

/// Encode i16 PCM samples as WAV bytes
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}
