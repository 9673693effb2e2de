//! Configuration for the three remote backends
//!
//! Each service gets its own config struct carrying an engine selector, an
//! API credential, and backend-specific parameters. The engine enums have
//! exactly one variant today; dispatching over them keeps the substitution
//! point explicit instead of hiding it behind plugin loading.

use crate::{Error, Result};

/// Environment variable holding the Deepgram credential
pub const DEEPGRAM_API_KEY: &str = "DEEPGRAM_API_KEY";

/// Environment variable holding the OpenAI credential (shared by LLM and TTS)
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Default system instruction sent ahead of every transcript
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Keep your responses concise and natural.";

/// Default synthesis voice
pub const DEFAULT_VOICE: &str = "alloy";

/// Speech-to-text backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttEngine {
    Deepgram,
}

/// Language model backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmEngine {
    OpenAi,
}

/// Text-to-speech backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsEngine {
    OpenAi,
}

/// Speech-to-text service configuration
#[derive(Debug, Clone)]
pub struct SttConfig {
    pub engine: SttEngine,
    pub api_key: String,
}

/// Language model service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub engine: LlmEngine,
    pub api_key: String,
    /// System instruction prepended to every exchange
    pub system_prompt: String,
}

/// Text-to-speech service configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub engine: TtsEngine,
    pub api_key: String,
    /// Synthesis voice name
    pub voice: String,
}

/// API credentials for the remote backends
#[derive(Debug, Clone)]
pub struct Credentials {
    pub deepgram_api_key: String,
    pub openai_api_key: String,
}

impl Credentials {
    /// Load credentials from the process environment
    ///
    /// # Errors
    ///
    /// Returns a single `Error::Config` enumerating every missing variable,
    /// so a user with neither key set sees both names at once.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load credentials through an arbitrary lookup function
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming all variables the lookup failed to
    /// resolve to a non-empty value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing = Vec::new();

        let deepgram_api_key = lookup(DEEPGRAM_API_KEY).filter(|v| !v.is_empty());
        if deepgram_api_key.is_none() {
            missing.push(DEEPGRAM_API_KEY);
        }

        let openai_api_key = lookup(OPENAI_API_KEY).filter(|v| !v.is_empty());
        if openai_api_key.is_none() {
            missing.push(OPENAI_API_KEY);
        }

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            deepgram_api_key: deepgram_api_key.unwrap_or_default(),
            openai_api_key: openai_api_key.unwrap_or_default(),
        })
    }

    /// Build the speech-to-text config from these credentials
    #[must_use]
    pub fn stt_config(&self) -> SttConfig {
        SttConfig {
            engine: SttEngine::Deepgram,
            api_key: self.deepgram_api_key.clone(),
        }
    }

    /// Build the language model config from these credentials
    #[must_use]
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            engine: LlmEngine::OpenAi,
            api_key: self.openai_api_key.clone(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Build the text-to-speech config from these credentials
    #[must_use]
    pub fn tts_config(&self) -> TtsConfig {
        TtsConfig {
            engine: TtsEngine::OpenAi,
            api_key: self.openai_api_key.clone(),
            voice: DEFAULT_VOICE.to_string(),
        }
    }
}
