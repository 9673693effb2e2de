//! Text-to-speech client

use crate::config::{TtsConfig, TtsEngine};
use crate::{Error, Result};

/// Synthesis model
const TTS_MODEL: &str = "tts-1";

/// Output container format; lossless so playback can decode with hound
const OUTPUT_FORMAT: &str = "wav";

/// Outcome of a synthesis request
///
/// "No audio produced" is a legitimate, recoverable end state for a turn, not
/// an error, so the synthesizer reports it as an explicit variant instead of
/// an `Err`. Callers must check the variant before treating output as
/// playable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
    /// Synthesized audio container bytes
    Audio(Vec<u8>),
    /// The backend produced no audio; the turn continues without playback
    Unavailable,
}

impl Synthesis {
    /// Whether audio was produced
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Audio(_))
    }
}

/// Synthesizes speech from reply text via a remote backend
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize the text with the fixed voice and container format
    ///
    /// Never fails: transport and API errors are logged and reported as
    /// [`Synthesis::Unavailable`].
    async fn synthesize(&self, text: &str) -> Synthesis;
}

/// Build the synthesizer selected by the config
///
/// # Errors
///
/// Returns error if the API key is missing
pub fn build_synthesizer(config: &TtsConfig) -> Result<Box<dyn Synthesizer>> {
    match config.engine {
        TtsEngine::OpenAi => Ok(Box::new(OpenAiSynthesizer::new(config)?)),
    }
}

#[derive(serde::Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// OpenAI speech synthesizer
pub struct OpenAiSynthesizer {
    client: reqwest::Client,
    api_key: String,
    voice: String,
}

impl OpenAiSynthesizer {
    /// Create a new OpenAI synthesizer
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(config: &TtsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            voice: config.voice.clone(),
        })
    }

    async fn request_speech(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            model: TTS_MODEL,
            input: text,
            voice: &self.voice,
            response_format: OUTPUT_FORMAT,
        };

        let response = self
            .client
            .post("https://api.openai.com/v1/audio/speech")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Audio(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait::async_trait]
impl Synthesizer for OpenAiSynthesizer {
    async fn synthesize(&self, text: &str) -> Synthesis {
        tracing::debug!(chars = text.len(), voice = %self.voice, "synthesizing speech");

        match self.request_speech(text).await {
            Ok(audio) if !audio.is_empty() => {
                tracing::info!(audio_bytes = audio.len(), "synthesis complete");
                Synthesis::Audio(audio)
            }
            Ok(_) => {
                tracing::warn!("synthesis returned no audio");
                Synthesis::Unavailable
            }
            Err(e) => {
                tracing::warn!(error = %e, "synthesis failed");
                Synthesis::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speech_request_shape() {
        let request = SpeechRequest {
            model: TTS_MODEL,
            input: "hi there",
            voice: "alloy",
            response_format: OUTPUT_FORMAT,
        };

        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        assert_eq!(json["model"], "tts-1");
        assert_eq!(json["input"], "hi there");
        assert_eq!(json["voice"], "alloy");
        assert_eq!(json["response_format"], "wav");
    }

    #[test]
    fn test_synthesis_availability() {
        assert!(Synthesis::Audio(vec![1, 2, 3]).is_available());
        assert!(!Synthesis::Unavailable.is_available());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = TtsConfig {
            engine: TtsEngine::OpenAi,
            api_key: String::new(),
            voice: "alloy".to_string(),
        };

        assert!(matches!(
            OpenAiSynthesizer::new(&config),
            Err(Error::Config(_))
        ));
    }
}
