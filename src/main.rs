use anyhow::Result;
use clap::Parser;
use deja::api::VerifierClient;
use deja::audio::segmenter::SegmenterConfig;
use deja::cli::{Cli, Commands};
use deja::config::Config;
use deja::detector::DetectorConfig;
use deja::pipeline::status::{LogReporter, NullReporter, StatusReporter};
use deja::pipeline::{Pipeline, PipelineConfig, StdoutSink};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        None | Some(Commands::Listen) => {
            run_listen(config, cli.quiet).await?;
        }
        Some(Commands::Enroll { seconds }) => {
            run_enroll(config, seconds).await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
    }

    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/deja/config.toml)
/// 3. Built-in defaults with environment variable overrides
///
/// CLI flags (--server, --device) override everything.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(path) = cli.config.as_deref() {
        Config::load(path)?
    } else if let Some(default_path) = Config::default_path() {
        Config::load_or_default(&default_path)?
    } else {
        Config::default()
    };

    config = config.with_env_overrides();

    if let Some(server) = &cli.server {
        config.server.base_url = server.clone();
    }
    if let Some(device) = &cli.device {
        config.audio.device = Some(device.clone());
    }

    Ok(config)
}

fn pipeline_config(config: &Config) -> PipelineConfig {
    PipelineConfig {
        segmenter: SegmenterConfig {
            voice_threshold: config.audio.voice_threshold,
            silence_patience: config.audio.silence_patience,
            min_utterance_ms: config.audio.min_utterance_ms,
            sample_rate: config.audio.sample_rate,
        },
        detector: DetectorConfig {
            similarity_threshold: config.detector.similarity_threshold,
            time_window: Duration::from_secs(config.detector.time_window_secs),
            stop_words: config.detector.stop_words.clone(),
        },
        ..PipelineConfig::default()
    }
}

/// Run the listening pipeline.
///
/// Mic mode runs until Ctrl+C. When stdin carries WAV data (pipe mode)
/// the file is segmented instead and the process exits once the last
/// transcription has been applied.
async fn run_listen(config: Config, quiet: bool) -> Result<()> {
    let backend = VerifierClient::new(
        &config.server.base_url,
        Duration::from_secs(config.server.request_timeout_secs),
    )?;

    let reporter: Arc<dyn StatusReporter> = if quiet {
        Arc::new(NullReporter)
    } else {
        Arc::new(LogReporter)
    };

    let mic_mode = std::io::stdin().is_terminal();
    let source: Box<dyn deja::AudioSource> = if mic_mode {
        open_microphone(config.audio.device.as_deref())?
    } else {
        // Pad with silence so an utterance running to end-of-file flushes.
        let padding = config.audio.silence_patience as usize + 1;
        Box::new(deja::audio::wav::WavFileSource::from_stdin()?.with_trailing_silence(padding))
    };

    let handle = Pipeline::start(
        source,
        Arc::new(backend),
        Box::new(StdoutSink),
        reporter,
        pipeline_config(&config),
    )?;

    if mic_mode {
        tokio::signal::ctrl_c().await?;
        eprintln!();
    } else {
        // File blocks are consumed without pacing; a short grace period
        // lets the capture loop drain before shutdown waits out the
        // in-flight transcriptions.
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    handle.shutdown().await?;

    Ok(())
}

/// Record a voice sample and register it as the owner's profile.
async fn run_enroll(config: Config, seconds: u64) -> Result<()> {
    let backend = VerifierClient::new(
        &config.server.base_url,
        Duration::from_secs(config.server.request_timeout_secs),
    )?;

    let mut source = open_microphone(config.audio.device.as_deref())?;
    eprintln!(
        "Recording {} seconds of audio. Read a sentence in your normal voice...",
        seconds
    );

    let message = deja::enroll::enroll_voice(
        source.as_mut(),
        &backend,
        config.audio.sample_rate,
        seconds,
    )
    .await?;
    println!("{}", message);

    Ok(())
}

#[cfg(feature = "cpal-audio")]
fn open_microphone(device: Option<&str>) -> Result<Box<dyn deja::AudioSource>> {
    let source = deja::audio::capture::CpalAudioSource::new(device)?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "cpal-audio"))]
fn open_microphone(_device: Option<&str>) -> Result<Box<dyn deja::AudioSource>> {
    anyhow::bail!("built without the cpal-audio feature; no microphone support")
}

/// List available audio input devices.
#[cfg(feature = "cpal-audio")]
fn list_audio_devices() -> Result<()> {
    let devices = deja::audio::capture::list_devices()?;

    if devices.is_empty() {
        eprintln!("No audio input devices found");
        std::process::exit(1);
    }

    println!("Available audio input devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }

    Ok(())
}

#[cfg(not(feature = "cpal-audio"))]
fn list_audio_devices() -> Result<()> {
    anyhow::bail!("built without the cpal-audio feature; no microphone support")
}
