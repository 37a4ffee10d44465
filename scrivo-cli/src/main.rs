//! Scrivo command-line host.
//!
//! A thin presentation layer over [`scrivo_core::SessionController`]: it
//! collects a file and options from argv, drives the controller, and renders
//! snapshots and events to the terminal. All request/response state lives in
//! the controller; this binary only reads it.

mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scrivo_core::{
    AudioUpload, HttpTranscriptionService, ModelSize, ServiceConfig, SessionController,
    SessionStatus, SubmitParams, TranscriptionService,
};
use tracing::{debug, info};

use config::AppConfig;

#[derive(Parser)]
#[command(name = "scrivo", version, about = "Submit audio files to a transcription service")]
struct Cli {
    /// Service base URL (overrides the configured default).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload an audio file and print its transcription.
    Transcribe {
        /// Path to the audio file.
        file: PathBuf,
        /// ISO language hint, e.g. "en" (omit for auto-detection).
        #[arg(short, long)]
        language: Option<String>,
        /// Whisper model size (tiny|base|small|medium|large).
        #[arg(short, long)]
        model_size: Option<ModelSize>,
        /// Skip the per-segment timing lines.
        #[arg(long)]
        no_segments: bool,
    },
    /// List previously completed transcriptions.
    History,
    /// Probe the service health endpoint.
    Health,
    /// Show or update the persisted defaults.
    Config {
        /// Persist a new default service base URL.
        #[arg(long)]
        set_server: Option<String>,
        /// Persist a new default model size.
        #[arg(long)]
        set_model_size: Option<ModelSize>,
        /// Persist a whole-request timeout in seconds (0 clears it).
        #[arg(long)]
        set_timeout_secs: Option<u64>,
        /// Persist a history fetch limit, 1..=100 (0 clears it).
        #[arg(long)]
        set_history_limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrivo=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = config::default_config_path();
    let mut app_config = config::load_config(&config_path);
    if let Some(server) = cli.server {
        app_config.server_url = server;
        app_config.normalize();
    }

    match cli.command {
        Command::Config {
            set_server,
            set_model_size,
            set_timeout_secs,
            set_history_limit,
        } => run_config(
            &config_path,
            set_server,
            set_model_size,
            set_timeout_secs,
            set_history_limit,
        ),
        command => {
            debug!(server = %app_config.server_url, config_path = ?config_path, "scrivo starting");
            let service: Arc<dyn TranscriptionService> = Arc::new(
                HttpTranscriptionService::new(ServiceConfig {
                    base_url: app_config.server_url.clone(),
                    timeout: app_config.request_timeout_secs.map(Duration::from_secs),
                    history_limit: app_config.history_limit,
                })
                .context("building the service client")?,
            );
            let controller = SessionController::new(Arc::clone(&service));

            match command {
                Command::Transcribe {
                    file,
                    language,
                    model_size,
                    no_segments,
                } => {
                    let model_size = model_size.unwrap_or(app_config.default_model_size);
                    run_transcribe(&controller, file, language, model_size, !no_segments).await
                }
                Command::History => run_history(&controller).await,
                Command::Health => run_health(service.as_ref()).await,
                Command::Config { .. } => unreachable!("handled above"),
            }
        }
    }
}

async fn run_transcribe(
    controller: &SessionController,
    file: PathBuf,
    language: Option<String>,
    model_size: ModelSize,
    show_segments: bool,
) -> Result<()> {
    let bytes =
        std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", file.display());
    }
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio")
        .to_string();

    let _sync = controller.spawn_history_sync();
    controller.refresh_history().await;

    let mut status_rx = controller.subscribe_status();
    let mut history_rx = controller.subscribe_history();
    let token = controller.submit(AudioUpload { filename, bytes }, SubmitParams {
        language,
        model_size,
    });

    // Wait for this request to settle; ignore events for any other token.
    loop {
        let event = status_rx
            .recv()
            .await
            .context("status event stream closed")?;
        if event.request != token {
            continue;
        }
        match event.status {
            SessionStatus::Submitting => info!(request = event.request, "uploading"),
            SessionStatus::Succeeded | SessionStatus::Failed => break,
            SessionStatus::Idle => {}
        }
    }

    let snapshot = controller.snapshot();
    match snapshot.status {
        SessionStatus::Succeeded => {
            if let Some(result) = snapshot.result.as_ref() {
                render::transcription(result, show_segments);
            }
        }
        SessionStatus::Failed => {
            if let Some(error) = snapshot.error {
                bail!("transcription failed: {error}");
            }
            bail!("transcription failed");
        }
        status => bail!("unexpected session status after settlement: {status:?}"),
    }

    // Wait briefly for the event-driven history sync so the entry count is
    // accurate; the submission itself already succeeded either way.
    match tokio::time::timeout(Duration::from_secs(10), history_rx.recv()).await {
        Ok(Ok(update)) => info!(entries = update.entries, "history synchronized"),
        _ => debug!("history sync still pending at exit"),
    }
    Ok(())
}

async fn run_history(controller: &SessionController) -> Result<()> {
    controller.refresh_history().await;
    let snapshot = controller.snapshot();
    if snapshot.history.is_empty() {
        if controller.diagnostics_snapshot().history_failures > 0 {
            bail!("the history fetch failed; check the service and try again");
        }
        println!("no transcriptions yet");
        return Ok(());
    }
    render::history(&snapshot.history);
    Ok(())
}

async fn run_health(service: &dyn TranscriptionService) -> Result<()> {
    let health = service
        .check_health()
        .await
        .context("the health probe failed")?;
    render::health(&health);
    Ok(())
}

fn run_config(
    config_path: &std::path::Path,
    set_server: Option<String>,
    set_model_size: Option<ModelSize>,
    set_timeout_secs: Option<u64>,
    set_history_limit: Option<usize>,
) -> Result<()> {
    let mut config = config::load_config(config_path);
    let changed = set_server.is_some()
        || set_model_size.is_some()
        || set_timeout_secs.is_some()
        || set_history_limit.is_some();

    if let Some(server) = set_server {
        config.server_url = server;
    }
    if let Some(model_size) = set_model_size {
        config.default_model_size = model_size;
    }
    if let Some(secs) = set_timeout_secs {
        config.request_timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(limit) = set_history_limit {
        config.history_limit = (limit > 0).then_some(limit);
    }
    config.normalize();

    if changed {
        config::save_config(config_path, &config)
            .with_context(|| format!("writing {}", config_path.display()))?;
        info!(config_path = ?config_path, "configuration saved");
    }
    print_config(&config);
    Ok(())
}

fn print_config(config: &AppConfig) {
    println!("server:       {}", config.server_url);
    println!("model size:   {}", config.default_model_size);
    match config.request_timeout_secs {
        Some(secs) => println!("timeout:      {secs}s"),
        None => println!("timeout:      none (wait indefinitely)"),
    }
    match config.history_limit {
        Some(limit) => println!("history limit: {limit}"),
        None => println!("history limit: service default"),
    }
}
