use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use voicebot::audio::{AudioCapture, AudioPlayback, Player, Recorder};
use voicebot::{Credentials, Error, VoiceBot};

/// voicebot - record a question, hear the answer
#[derive(Parser)]
#[command(name = "voicebot", version, about)]
struct Cli {
    /// Recording duration in seconds
    #[arg(short, long, env = "VOICEBOT_DURATION", default_value = "5")]
    duration: u32,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Test microphone input without contacting any backend
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "3")]
        duration: u32,
    },
    /// Test speaker output with a sine tone
    TestSpeaker,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info,voicebot=info",
        1 => "info,voicebot=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    if let Some(cmd) = cli.command {
        let result = match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
        };

        return match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("fatal: {e}");
                ExitCode::FAILURE
            }
        };
    }

    match run(cli.duration).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Config(msg)) => {
            eprintln!("Configuration error: {msg}");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("An error occurred: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run one conversation turn
async fn run(duration: u32) -> voicebot::Result<()> {
    // Credentials are validated before any backend is contacted
    let credentials = Credentials::from_env()?;

    let mut bot = VoiceBot::new(
        &credentials.stt_config(),
        &credentials.llm_config(),
        &credentials.tts_config(),
    )?
    .with_record_secs(duration);

    println!("Voice bot initialized");
    println!("Listening... (press Ctrl-C to exit)");

    // Biased with the signal arm first: its first poll registers the SIGINT
    // handler before the turn's blocking capture starts, so an interrupt
    // during recording is caught instead of killing the process
    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            println!("\nStopping...");
        }
        (outcome, metrics) = bot.run_turn() => {
            tracing::debug!(?outcome, "turn finished");
            println!("\n{}", metrics.summary());
        }
    }

    Ok(())
}

/// Record a short clip and report input levels
async fn test_mic(duration: u32) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    let clip = capture.record(duration).await?;

    let samples = clip.samples();
    let rms = calculate_rms(samples);
    let peak = samples
        .iter()
        .map(|&s| f32::from(s).abs() / 32768.0)
        .fold(0.0f32, f32::max);

    println!("Captured {} samples", samples.len());
    println!("RMS: {rms:.4} | Peak: {peak:.4}");
    println!("\nIf RMS stayed near 0, check that your mic is plugged in");
    println!("and selected as the default input device.");

    Ok(())
}

/// Calculate RMS energy of i16 samples, normalized to [0, 1]
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples
        .iter()
        .map(|&s| {
            let norm = f32::from(s) / 32768.0;
            norm * norm
        })
        .sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Play a 440Hz sine tone through the default output device
async fn test_speaker() -> anyhow::Result<()> {
    use std::io::Write;

    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let sample_rate = 24000u32;
    let frequency = 440.0f32;
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    let samples: Vec<i16> = (0..sample_rate * 2)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let value = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3;
            (value * 32767.0) as i16
        })
        .collect();

    let wav = voicebot::audio::encode_wav(&samples, sample_rate, 1)?;
    let mut container = tempfile::NamedTempFile::new()?;
    container.write_all(&wav)?;
    container.flush()?;

    let mut playback = AudioPlayback::new()?;
    playback.play(container.path()).await?;

    println!("If you heard the tone, your speakers are working!");
    Ok(())
}
