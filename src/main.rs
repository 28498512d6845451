use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use voxprobe_core::AppConfig;
use voxprobe_scenario::ScenarioRunner;

#[derive(Parser)]
#[command(name = "voxprobe", about = "End-to-end check for streaming speech transcription")]
struct Cli {
    /// Path to the configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Audio sample to stream, overriding `audio.source_path`
    #[arg(short, long)]
    audio: Option<PathBuf>,

    /// WebSocket URL to stream to, overriding the environment and config
    #[arg(short, long)]
    url: Option<String>,

    /// Skip the advisory HTTP/WebSocket diagnostics
    #[arg(long)]
    skip_diagnostics: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("failed to load config from {path:?}"))?,
        None => AppConfig::default(),
    };
    if let Some(audio) = cli.audio {
        config.audio.source_path = audio;
    }
    if cli.skip_diagnostics {
        config.diagnostics.enabled = false;
    }

    let env_filter = EnvFilter::try_new(&config.general.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        );

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    tracing::info!("voxprobe starting");

    let mut runner = ScenarioRunner::new(config);
    if let Some(url) = cli.url {
        runner = runner.with_target_url(url);
    }
    tracing::info!("target: {}", runner.target_url());

    let verdict = runner.run().await;
    Ok(ExitCode::from(verdict.exit_code()))
}
