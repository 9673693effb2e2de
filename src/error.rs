//! Error types for voicebot

use thiserror::Error;

/// Result type alias for voicebot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a conversation turn
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credentials, bad settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or container error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error (remote call or malformed response)
    #[error("STT error: {0}")]
    Stt(String),

    /// Language model error (remote call or malformed response)
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
