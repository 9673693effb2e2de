//! Conversation turn integration tests
//!
//! Runs the orchestrator against deterministic fakes for every stage, so no
//! audio hardware or network access is needed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use voicebot::audio::{AudioClip, Player, Recorder, SAMPLE_RATE};
use voicebot::llm::{LlmReply, Responder};
use voicebot::stt::Transcriber;
use voicebot::tts::{Synthesis, Synthesizer};
use voicebot::{Error, TurnOutcome, VoiceBot};

/// Recorder returning a fixed-length silent clip
struct FakeRecorder {
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Recorder for FakeRecorder {
    async fn record(&mut self, duration_secs: u32) -> voicebot::Result<AudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let samples = vec![0i16; duration_secs as usize * SAMPLE_RATE as usize];
        let mut clip = AudioClip::new(samples, SAMPLE_RATE, 1);
        clip.spool()?;
        Ok(clip)
    }
}

/// Recorder whose device always fails
struct BrokenRecorder;

#[async_trait::async_trait]
impl Recorder for BrokenRecorder {
    async fn record(&mut self, _duration_secs: u32) -> voicebot::Result<AudioClip> {
        Err(Error::Audio("no input device available".to_string()))
    }
}

/// Player that captures what it was asked to play
struct FakePlayer {
    plays: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    fail: bool,
}

#[async_trait::async_trait]
impl Player for FakePlayer {
    async fn play(&mut self, path: &Path) -> voicebot::Result<()> {
        if self.fail {
            return Err(Error::Audio("output device gone".to_string()));
        }
        // The container must exist while playback runs
        let bytes = std::fs::read(path)?;
        self.plays.lock().unwrap().push((path.to_path_buf(), bytes));
        Ok(())
    }
}

/// Transcriber returning a scripted transcript
struct FakeTranscriber {
    transcript: String,
    elapsed: f64,
    calls: Arc<AtomicUsize>,
    seen_paths: Arc<Mutex<Vec<Option<PathBuf>>>>,
}

#[async_trait::async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> voicebot::Result<(String, f64)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_paths
            .lock()
            .unwrap()
            .push(clip.spool_path().map(Path::to_path_buf));
        Ok((self.transcript.clone(), self.elapsed))
    }
}

/// Transcriber whose backend always fails
struct BrokenTranscriber;

#[async_trait::async_trait]
impl Transcriber for BrokenTranscriber {
    async fn transcribe(&self, _clip: AudioClip) -> voicebot::Result<(String, f64)> {
        Err(Error::Stt("Deepgram API error 500".to_string()))
    }
}

/// Responder returning a scripted reply
struct FakeResponder {
    reply: String,
    complete_secs: f64,
    calls: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Responder for FakeResponder {
    async fn query(&self, _text: &str) -> voicebot::Result<LlmReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmReply {
            text: self.reply.clone(),
            first_token_secs: 0.0,
            complete_secs: self.complete_secs,
        })
    }
}

/// Responder whose backend always fails
struct BrokenResponder;

#[async_trait::async_trait]
impl Responder for BrokenResponder {
    async fn query(&self, _text: &str) -> voicebot::Result<LlmReply> {
        Err(Error::Llm("OpenAI chat error 503".to_string()))
    }
}

/// Synthesizer returning scripted audio, or nothing
struct FakeSynthesizer {
    audio: Option<Vec<u8>>,
}

#[async_trait::async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, _text: &str) -> Synthesis {
        self.audio
            .clone()
            .map_or(Synthesis::Unavailable, Synthesis::Audio)
    }
}

struct Harness {
    recorder_calls: Arc<AtomicUsize>,
    stt_calls: Arc<AtomicUsize>,
    llm_calls: Arc<AtomicUsize>,
    plays: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
    seen_clip_paths: Arc<Mutex<Vec<Option<PathBuf>>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            recorder_calls: Arc::new(AtomicUsize::new(0)),
            stt_calls: Arc::new(AtomicUsize::new(0)),
            llm_calls: Arc::new(AtomicUsize::new(0)),
            plays: Arc::new(Mutex::new(Vec::new())),
            seen_clip_paths: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn bot(&self, transcript: &str, stt_secs: f64, reply: &str, audio: Option<Vec<u8>>) -> VoiceBot {
        VoiceBot::with_parts(
            Box::new(FakeRecorder {
                calls: Arc::clone(&self.recorder_calls),
            }),
            Box::new(FakePlayer {
                plays: Arc::clone(&self.plays),
                fail: false,
            }),
            Box::new(FakeTranscriber {
                transcript: transcript.to_string(),
                elapsed: stt_secs,
                calls: Arc::clone(&self.stt_calls),
                seen_paths: Arc::clone(&self.seen_clip_paths),
            }),
            Box::new(FakeResponder {
                reply: reply.to_string(),
                complete_secs: 0.8,
                calls: Arc::clone(&self.llm_calls),
            }),
            Box::new(FakeSynthesizer { audio }),
        )
    }
}

#[tokio::test]
async fn test_empty_transcript_skips_response_and_playback() {
    let harness = Harness::new();
    let mut bot = harness.bot("", 0.42, "unused", Some(vec![1, 2, 3]));

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::NoSpeech);
    assert_eq!(harness.llm_calls.load(Ordering::SeqCst), 0);
    assert!(harness.plays.lock().unwrap().is_empty());
    assert!((metrics.stt_processing_time - 0.42).abs() < f64::EPSILON);
    assert_eq!(metrics.llm_complete_time, 0.0);
    assert!(metrics.total_processing_time > 0.0);
}

#[test]
fn test_whitespace_transcript_counts_as_no_speech() {
    let harness = Harness::new();
    let mut bot = harness.bot("  \n\t ", 0.3, "unused", Some(vec![1]));

    let (outcome, _metrics) = tokio_test::block_on(bot.run_turn());

    assert_eq!(outcome, TurnOutcome::NoSpeech);
    assert_eq!(harness.llm_calls.load(Ordering::SeqCst), 0);
    assert!(harness.plays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_synthesis_unavailable_skips_playback_but_completes() {
    let harness = Harness::new();
    let mut bot = harness.bot("hello", 0.5, "hi there", None);

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Unvoiced);
    assert!(harness.plays.lock().unwrap().is_empty());
    assert_eq!(harness.llm_calls.load(Ordering::SeqCst), 1);
    assert!((metrics.llm_complete_time - 0.8).abs() < f64::EPSILON);
    assert!(metrics.total_processing_time > 0.0);
}

#[tokio::test]
async fn test_happy_path_plays_synthesized_audio_once() {
    let harness = Harness::new();
    let audio = vec![0x52, 0x49, 0x46, 0x46, 0xaa, 0xbb];
    let mut bot = harness.bot("hello", 0.5, "hi there", Some(audio.clone()));

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Completed);

    let plays = harness.plays.lock().unwrap();
    assert_eq!(plays.len(), 1);
    let (played_path, played_bytes) = &plays[0];
    assert_eq!(*played_bytes, audio);

    // The synthesis container is deleted once playback is done
    assert!(!played_path.exists());

    assert_eq!(metrics.llm_first_token_time, 0.0);
    assert!(metrics.total_processing_time > 0.0);
}

#[tokio::test]
async fn test_transcriber_failure_is_contained() {
    let harness = Harness::new();
    let mut bot = VoiceBot::with_parts(
        Box::new(FakeRecorder {
            calls: Arc::clone(&harness.recorder_calls),
        }),
        Box::new(FakePlayer {
            plays: Arc::clone(&harness.plays),
            fail: false,
        }),
        Box::new(BrokenTranscriber),
        Box::new(FakeResponder {
            reply: "unused".to_string(),
            complete_secs: 0.1,
            calls: Arc::clone(&harness.llm_calls),
        }),
        Box::new(FakeSynthesizer { audio: None }),
    );

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(harness.llm_calls.load(Ordering::SeqCst), 0);
    assert!(metrics.total_processing_time > 0.0);
    assert_eq!(metrics.stt_processing_time, 0.0);
}

#[tokio::test]
async fn test_responder_failure_keeps_stt_metrics() {
    let harness = Harness::new();
    let mut bot = VoiceBot::with_parts(
        Box::new(FakeRecorder {
            calls: Arc::clone(&harness.recorder_calls),
        }),
        Box::new(FakePlayer {
            plays: Arc::clone(&harness.plays),
            fail: false,
        }),
        Box::new(FakeTranscriber {
            transcript: "hello".to_string(),
            elapsed: 0.7,
            calls: Arc::clone(&harness.stt_calls),
            seen_paths: Arc::clone(&harness.seen_clip_paths),
        }),
        Box::new(BrokenResponder),
        Box::new(FakeSynthesizer { audio: None }),
    );

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert!((metrics.stt_processing_time - 0.7).abs() < f64::EPSILON);
    assert_eq!(metrics.llm_complete_time, 0.0);
    assert!(metrics.total_processing_time > 0.0);
    assert!(harness.plays.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_recorder_failure_is_contained() {
    let harness = Harness::new();
    let mut bot = VoiceBot::with_parts(
        Box::new(BrokenRecorder),
        Box::new(FakePlayer {
            plays: Arc::clone(&harness.plays),
            fail: false,
        }),
        Box::new(FakeTranscriber {
            transcript: "unused".to_string(),
            elapsed: 0.1,
            calls: Arc::clone(&harness.stt_calls),
            seen_paths: Arc::clone(&harness.seen_clip_paths),
        }),
        Box::new(FakeResponder {
            reply: "unused".to_string(),
            complete_secs: 0.1,
            calls: Arc::clone(&harness.llm_calls),
        }),
        Box::new(FakeSynthesizer { audio: None }),
    );

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(harness.stt_calls.load(Ordering::SeqCst), 0);
    assert!(metrics.total_processing_time > 0.0);
}

#[tokio::test]
async fn test_playback_failure_is_contained_with_total_set() {
    let harness = Harness::new();
    let mut bot = VoiceBot::with_parts(
        Box::new(FakeRecorder {
            calls: Arc::clone(&harness.recorder_calls),
        }),
        Box::new(FakePlayer {
            plays: Arc::clone(&harness.plays),
            fail: true,
        }),
        Box::new(FakeTranscriber {
            transcript: "hello".to_string(),
            elapsed: 0.2,
            calls: Arc::clone(&harness.stt_calls),
            seen_paths: Arc::clone(&harness.seen_clip_paths),
        }),
        Box::new(FakeResponder {
            reply: "hi".to_string(),
            complete_secs: 0.1,
            calls: Arc::clone(&harness.llm_calls),
        }),
        Box::new(FakeSynthesizer {
            audio: Some(vec![9, 9, 9]),
        }),
    );

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert!(metrics.total_processing_time > 0.0);
}

#[tokio::test]
async fn test_two_turns_are_independent() {
    let harness = Harness::new();
    let mut bot = harness.bot("hello", 0.5, "hi there", Some(vec![4, 5, 6]));

    let (first_outcome, first_metrics) = bot.run_turn().await;
    let (second_outcome, second_metrics) = bot.run_turn().await;

    assert_eq!(first_outcome, TurnOutcome::Completed);
    assert_eq!(second_outcome, TurnOutcome::Completed);

    assert_eq!(harness.recorder_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.stt_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.llm_calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.plays.lock().unwrap().len(), 2);

    // Each turn gets a fresh metrics record
    assert!(first_metrics.total_processing_time > 0.0);
    assert!(second_metrics.total_processing_time > 0.0);

    // No recording container leaks between turns
    for path in harness.seen_clip_paths.lock().unwrap().iter().flatten() {
        assert!(!path.exists());
    }
}

#[tokio::test]
async fn test_five_second_silent_clip_scenario() {
    // Transcription of silence yields "" after trimming
    let harness = Harness::new();
    let mut bot = harness.bot("", 1.1, "unused", Some(vec![1])).with_record_secs(5);

    let (outcome, metrics) = bot.run_turn().await;

    assert_eq!(outcome, TurnOutcome::NoSpeech);
    assert!(metrics.stt_processing_time > 0.0);
    assert_eq!(metrics.llm_complete_time, 0.0);
    assert!(metrics.total_processing_time > 0.0);
    assert!(harness.plays.lock().unwrap().is_empty());
}
