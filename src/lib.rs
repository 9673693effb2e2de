//! voicebot - a one-shot voice assistant loop
//!
//! Captures a short clip from the microphone, transcribes it, asks a language
//! model for a reply, speaks the reply, and reports per-stage latency:
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌────────────┐   ┌──────────┐
//! │  Record  ├──▶│ Transcribe ├──▶│  Respond  ├──▶│ Synthesize ├──▶│   Play   │
//! │  (cpal)  │   │ (Deepgram) │   │  (OpenAI) │   │  (OpenAI)  │   │  (cpal)  │
//! └──────────┘   └────────────┘   └───────────┘   └────────────┘   └──────────┘
//! ```
//!
//! The orchestrator ([`VoiceBot`]) owns the sequencing, the timing capture,
//! and the error containment: a failed stage ends the turn, never the
//! process. Each stage sits behind a trait so tests can run the loop against
//! deterministic fakes.

pub mod audio;
pub mod bot;
pub mod config;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod stt;
pub mod tts;

pub use bot::{DEFAULT_RECORD_SECS, TurnOutcome, VoiceBot};
pub use config::{Credentials, LlmConfig, LlmEngine, SttConfig, SttEngine, TtsConfig, TtsEngine};
pub use error::{Error, Result};
pub use metrics::PerformanceMetrics;
