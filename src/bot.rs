//! Conversation turn orchestration
//!
//! Sequences record → transcribe → respond → synthesize → play, timing each
//! stage into a metrics record. This is the single containment boundary for
//! stage failures: `run_turn` never returns `Err`, it reports a `Failed`
//! outcome with whatever metrics were accumulated.

use std::io::Write;
use std::time::Instant;

use tempfile::NamedTempFile;

use crate::Result;
use crate::audio::{AudioCapture, AudioPlayback, Player, Recorder};
use crate::config::{LlmConfig, SttConfig, TtsConfig};
use crate::llm::{Responder, build_responder};
use crate::metrics::PerformanceMetrics;
use crate::stt::{Transcriber, build_transcriber};
use crate::tts::{Synthesis, Synthesizer, build_synthesizer};

/// Default recording window per turn
pub const DEFAULT_RECORD_SECS: u32 = 5;

/// Terminal state of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Full pipeline ran and the reply was played back
    Completed,
    /// Transcript was empty; nothing to respond to
    NoSpeech,
    /// Reply was generated but synthesis produced no audio
    Unvoiced,
    /// A stage failed and the turn was abandoned
    Failed,
}

/// Orchestrates one record → transcribe → respond → synthesize → play cycle
pub struct VoiceBot {
    recorder: Box<dyn Recorder>,
    player: Box<dyn Player>,
    transcriber: Box<dyn Transcriber>,
    responder: Box<dyn Responder>,
    synthesizer: Box<dyn Synthesizer>,
    record_secs: u32,
}

impl VoiceBot {
    /// Create a bot wired to the default audio devices and the backends
    /// selected by the configs
    ///
    /// # Errors
    ///
    /// Returns error if an audio device is unavailable or a backend client
    /// cannot be constructed
    pub fn new(stt: &SttConfig, llm: &LlmConfig, tts: &TtsConfig) -> Result<Self> {
        Ok(Self::with_parts(
            Box::new(AudioCapture::new()?),
            Box::new(AudioPlayback::new()?),
            build_transcriber(stt)?,
            build_responder(llm)?,
            build_synthesizer(tts)?,
        ))
    }

    /// Create a bot from explicit parts
    ///
    /// This is the substitution point for tests: any stage can be replaced
    /// with a deterministic fake.
    #[must_use]
    pub fn with_parts(
        recorder: Box<dyn Recorder>,
        player: Box<dyn Player>,
        transcriber: Box<dyn Transcriber>,
        responder: Box<dyn Responder>,
        synthesizer: Box<dyn Synthesizer>,
    ) -> Self {
        Self {
            recorder,
            player,
            transcriber,
            responder,
            synthesizer,
            record_secs: DEFAULT_RECORD_SECS,
        }
    }

    /// Set the recording window for subsequent turns
    #[must_use]
    pub fn with_record_secs(mut self, secs: u32) -> Self {
        self.record_secs = secs;
        self
    }

    /// Run one conversation turn
    ///
    /// Never returns `Err`: stage failures are logged, the turn ends with
    /// `TurnOutcome::Failed`, and the partially populated metrics are still
    /// returned. `total_processing_time` is set on every path.
    pub async fn run_turn(&mut self) -> (TurnOutcome, PerformanceMetrics) {
        let start = Instant::now();
        let mut metrics = PerformanceMetrics::default();

        match self.try_turn(start, &mut metrics).await {
            Ok(outcome) => (outcome, metrics),
            Err(e) => {
                tracing::error!(error = %e, "turn failed");
                metrics.total_processing_time = start.elapsed().as_secs_f64();
                (TurnOutcome::Failed, metrics)
            }
        }
    }

    async fn try_turn(
        &mut self,
        start: Instant,
        metrics: &mut PerformanceMetrics,
    ) -> Result<TurnOutcome> {
        let clip = self.recorder.record(self.record_secs).await?;

        // The transcriber consumes the clip; its spooled container is deleted
        // inside the call whatever the outcome
        let (transcript, stt_secs) = self.transcriber.transcribe(clip).await?;
        metrics.stt_processing_time = stt_secs;

        if transcript.trim().is_empty() {
            tracing::info!("no speech detected, nothing to respond to");
            metrics.total_processing_time = start.elapsed().as_secs_f64();
            return Ok(TurnOutcome::NoSpeech);
        }

        tracing::info!(transcript = %transcript, "transcribed text");

        let reply = self.responder.query(&transcript).await?;
        tracing::info!(response = %reply.text, "reply generated");
        metrics.llm_first_token_time = reply.first_token_secs;
        metrics.llm_complete_time = reply.complete_secs;

        let synthesis = self.synthesizer.synthesize(&reply.text).await;

        // Playback is excluded from the turn total
        metrics.total_processing_time = start.elapsed().as_secs_f64();

        match synthesis {
            Synthesis::Audio(audio) => {
                let voiced = spool_container(&audio)?;
                self.player.play(voiced.path()).await?;
                // The synthesis container is deleted when `voiced` drops
                Ok(TurnOutcome::Completed)
            }
            Synthesis::Unavailable => {
                tracing::warn!("no response audio generated");
                Ok(TurnOutcome::Unvoiced)
            }
        }
    }
}

/// Write synthesized audio to a temporary container for playback
fn spool_container(audio: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(audio)?;
    file.flush()?;
    Ok(file)
}
