//! Speech-to-text client

use std::time::{Duration, Instant};

use crate::audio::AudioClip;
use crate::config::{SttConfig, SttEngine};
use crate::{Error, Result};

/// Deepgram recognition model
const DEEPGRAM_MODEL: &str = "nova-2";

/// Total request timeout; transcription of a clip can take a while
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Connect timeout for the recognition backend
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Response from Deepgram transcription API
#[derive(serde::Deserialize)]
struct DeepgramResponse {
    results: DeepgramResults,
}

#[derive(serde::Deserialize)]
struct DeepgramResults {
    channels: Vec<DeepgramChannel>,
}

#[derive(serde::Deserialize)]
struct DeepgramChannel {
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(serde::Deserialize)]
struct DeepgramAlternative {
    transcript: String,
}

/// Transcribes recorded clips via a remote recognition backend
///
/// Consumes the clip by value: the clip (and its spooled container) is gone
/// once the call returns, whatever the outcome.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a clip, returning the trimmed transcript and elapsed seconds
    ///
    /// An empty transcript is a valid result meaning "no speech detected".
    ///
    /// # Errors
    ///
    /// Returns error if the remote call fails or the response shape is
    /// unexpected
    async fn transcribe(&self, clip: AudioClip) -> Result<(String, f64)>;
}

/// Build the transcriber selected by the config
///
/// # Errors
///
/// Returns error if the client cannot be constructed
pub fn build_transcriber(config: &SttConfig) -> Result<Box<dyn Transcriber>> {
    match config.engine {
        SttEngine::Deepgram => Ok(Box::new(DeepgramTranscriber::new(config)?)),
    }
}

/// Deepgram prerecorded-audio transcriber
pub struct DeepgramTranscriber {
    client: reqwest::Client,
    api_key: String,
}

impl DeepgramTranscriber {
    /// Create a new Deepgram transcriber
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the client cannot be built
    pub fn new(config: &SttConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("Deepgram API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<(String, f64)> {
        let start = Instant::now();
        let wav = clip.to_wav_bytes()?;
        tracing::debug!(audio_bytes = wav.len(), "starting Deepgram transcription");
        // The clip and its spooled container are dropped here, before the
        // network call, so no recording outlives this turn
        drop(clip);

        let url = format!(
            "https://api.deepgram.com/v1/listen?model={DEEPGRAM_MODEL}&language=en-US&punctuate=true&utterances=true"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .body(wav)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Deepgram request failed");
                e
            })?;

        let status = response.status();
        tracing::debug!(status = %status, "received response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Deepgram API error");
            return Err(Error::Stt(format!("Deepgram API error {status}: {body}")));
        }

        let result: DeepgramResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse Deepgram response");
            e
        })?;

        let transcript = extract_transcript(&result)?;
        let elapsed = start.elapsed().as_secs_f64();

        tracing::info!(transcript = %transcript, elapsed, "transcription complete");
        Ok((transcript, elapsed))
    }
}

/// Pull the first channel's top alternative out of the nested response
fn extract_transcript(response: &DeepgramResponse) -> Result<String> {
    response
        .results
        .channels
        .first()
        .and_then(|c| c.alternatives.first())
        .map(|a| a.transcript.trim().to_string())
        .ok_or_else(|| Error::Stt("Deepgram response has no transcript alternative".to_string()))
}
