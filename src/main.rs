use std::io::BufRead;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aura_gateway::db::{self, RECENT_LIMIT, VaultRepo};
use aura_gateway::responder::{HostedResponder, KeywordResponder, Responder, ResponderKind};
use aura_gateway::voice::{
    AudioCapture, AudioPlayback, MicSource, SpeakerSink, SpeechToText, TextToSpeech,
};
use aura_gateway::{
    Config, ControllerConfig, GroqClient, Transcriber, Turn, TurnController, VoiceIdentity,
    WebSearchTool,
};

/// Aura - voice assistant with a phase-gated turn loop
#[derive(Parser)]
#[command(name = "aura", version, about)]
struct Cli {
    /// Responder strategy ("keyword" or "hosted")
    #[arg(short, long, env = "AURA_RESPONDER", default_value = "keyword")]
    responder: String,

    /// Voice identity ("female" or "male")
    #[arg(long, env = "AURA_VOICE")]
    voice: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Text-only REPL against the configured responder
    Chat,
    /// Show recent conversation vault entries
    Vault {
        /// Number of entries to show
        #[arg(short, long, default_value_t = RECENT_LIMIT)]
        limit: usize,
    },
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,aura_gateway=info",
        1 => "info,aura_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load()?;
    let kind = ResponderKind::from_str(&cli.responder);
    let voice = cli
        .voice
        .as_deref()
        .map_or(config.voice.identity, VoiceIdentity::from_str);

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Chat => chat(&config, kind).await,
            Command::Vault { limit } => show_vault(&config, limit),
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => test_speaker().await,
            Command::TestTts { text } => test_tts(&config, voice, &text).await,
        };
    }

    tracing::info!(responder = ?kind, voice = %voice, "starting aura gateway");

    let pool = db::init(&config.db_path)?;
    let store = VaultRepo::new(pool);
    let responder = build_responder(&config, kind)?;

    let transcriber: Box<dyn Transcriber> = match config.api_keys.deepgram.clone() {
        Some(key) => Box::new(SpeechToText::new_deepgram(key, "nova-2".to_string())?),
        None => Box::new(SpeechToText::new_whisper(
            config.openai_key()?.to_string(),
            config.voice.stt_model.clone(),
        )?),
    };

    let source = MicSource::new(config.voice.listen_timeout, config.voice.calibration)?;
    let tts = TextToSpeech::with_model(
        config.openai_key()?.to_string(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?;
    let sink = SpeakerSink::new(tts, AudioPlayback::new()?);

    let controller_config = ControllerConfig {
        context_turns: config.context_turns,
        voice,
        ..ControllerConfig::default()
    };

    let mut controller = TurnController::new(
        Box::new(source),
        transcriber,
        responder,
        Box::new(sink),
        Box::new(store),
        controller_config,
    );

    // Ctrl-C deactivates the loop at the next phase boundary
    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            stop.raise();
        }
    });

    tracing::info!("aura ready - say something, or \"goodbye\" to stop");
    controller.run().await?;

    tracing::info!("aura stopped");
    Ok(())
}

/// Build the selected responder strategy
fn build_responder(config: &Config, kind: ResponderKind) -> anyhow::Result<Box<dyn Responder>> {
    match kind {
        ResponderKind::Keyword => Ok(Box::new(KeywordResponder::new())),
        ResponderKind::Hosted => {
            let client = GroqClient::new(config.groq_key()?.to_string())?;
            let mut responder = HostedResponder::new(
                Box::new(client),
                config.llm.model.clone(),
                config.llm.system_prompt.clone(),
                config.llm.max_tokens,
            );

            if let Some(key) = config.api_keys.brave.clone() {
                responder = responder.with_search(Box::new(WebSearchTool::new_brave(key)));
            } else if let Some(key) = config.api_keys.serper.clone() {
                responder = responder.with_search(Box::new(WebSearchTool::new_serper(key)));
            } else {
                tracing::info!("no search API key set, hosted responder runs without web search");
            }

            Ok(Box::new(responder))
        }
    }
}

/// Text-only REPL for exercising responders without audio hardware
#[allow(clippy::future_not_send)]
async fn chat(config: &Config, kind: ResponderKind) -> anyhow::Result<()> {
    let responder = build_responder(config, kind)?;
    let pool = db::init(&config.db_path)?;
    let vault = VaultRepo::new(pool);
    let mut transcript: Vec<Turn> = Vec::new();

    println!("Aura text chat ({kind:?}). Type \"exit\" to quit.");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::Write::flush(&mut std::io::stdout())?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(utterance) = aura_gateway::transcript::normalize(&line) else {
            continue;
        };
        if utterance.eq_ignore_ascii_case("exit") || utterance.eq_ignore_ascii_case("quit") {
            break;
        }

        let context_start = transcript.len().saturating_sub(config.context_turns);
        let reply = responder
            .respond(&utterance, &transcript[context_start..])
            .await?;
        println!("{}", reply.text);

        vault.insert(&utterance, &reply.text, reply.timestamp)?;
        transcript.push(Turn {
            utterance: aura_gateway::Utterance::new(utterance),
            reply,
        });
    }

    println!("Goodbye!");
    Ok(())
}

/// Print recent vault entries, newest first
fn show_vault(config: &Config, limit: usize) -> anyhow::Result<()> {
    let pool = db::init(&config.db_path)?;
    let vault = VaultRepo::new(pool);

    let entries = vault.newest(limit)?;
    if entries.is_empty() {
        println!("Vault is empty");
        return Ok(());
    }

    for entry in entries {
        println!("[{}] {}", entry.id, entry.timestamp);
        println!("  you:  {}", entry.query);
        println!("  aura: {}", entry.reply);
    }

    Ok(())
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mut capture = AudioCapture::new()?;
    capture.start()?;

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = capture.drain();
        let energy = calculate_rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        // Visual meter
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!(
            "[{:2}s] RMS: {:.4} | Peak: {:.4} | [{}]",
            i + 1,
            energy,
            peak,
            meter
        );
    }

    capture.stop();

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Calculate RMS energy
#[allow(clippy::cast_precision_loss)]
fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

/// Test speaker output with a sine wave
#[allow(clippy::future_not_send)]
async fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let mut playback = AudioPlayback::new()?;

    let sample_rate = 24000_f32;
    let frequency = 440.0_f32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let num_samples = (sample_rate * 2.0) as usize;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples...", samples.len());
    playback.play(samples).await?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If not, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output
#[allow(clippy::future_not_send)]
async fn test_tts(config: &Config, voice: VoiceIdentity, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::with_model(
        config.openai_key()?.to_string(),
        config.voice.tts_speed,
        config.voice.tts_model.clone(),
    )?;

    println!("Synthesizing speech...");
    let mp3_data = tts.synthesize(text, voice).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    let mut playback = AudioPlayback::new()?;
    playback.play_mp3(&mp3_data).await?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}
