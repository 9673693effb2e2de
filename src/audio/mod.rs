//! Audio device I/O
//!
//! Thin wrappers over the default input/output devices, behind trait seams so
//! the conversation loop can run against fakes in tests.

mod capture;
mod clip;
mod playback;

use std::path::Path;

use crate::Result;

pub use capture::AudioCapture;
pub use clip::{AudioClip, CHUNK_SIZE, SAMPLE_RATE, chunk_aligned_len, encode_wav};
pub use playback::AudioPlayback;

/// Records fixed-duration clips from an input device
#[async_trait::async_trait]
pub trait Recorder: Send {
    /// Record a clip of the given duration at 16kHz mono
    ///
    /// # Errors
    ///
    /// Returns error if the device cannot be opened or read
    async fn record(&mut self, duration_secs: u32) -> Result<AudioClip>;
}

/// Plays audio containers through an output device
#[async_trait::async_trait]
pub trait Player: Send {
    /// Play the WAV container at `path` until exhausted
    ///
    /// # Errors
    ///
    /// Returns error if the container cannot be decoded or the device fails
    async fn play(&mut self, path: &Path) -> Result<()>;
}
