//! RTSP Viewer - play and record RTSP streams.
//!
//! This is the main library crate. It provides the session lifecycle that
//! drives a media engine, the engine backends, and the player commands.

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod session;
pub mod utils;

use cli::Cli;
use commands::player::{self, PlayerState};
use config::PlayerConfig;
use engine::{DisplaySurface, FfmpegEngine};
use session::SessionEvent;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rtsp_viewer=debug,rtsp_viewer_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the viewer until the recording finishes or Ctrl-C
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    init_tracing();
    tracing::info!("Starting RTSP Viewer v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.recordings_dir = dir;
    }

    let state = PlayerState::new(Box::new(FfmpegEngine::with_binary(&cli.ffmpeg)), config);

    let mut events = state.controller.lock().await.events();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(SessionEvent::Error(message)) => tracing::warn!("{}", message),
                Ok(event) => tracing::debug!("Session event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Skipped {} session events", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    player::set_rtsp_url(&state, cli.url.clone()).await;
    player::attach_video_surface(&state, DisplaySurface::new(1, "headless")).await?;
    player::play_stream(&state, cli.url.clone()).await?;

    let result = match cli.record {
        Some(name) => record(&state, name, cli.duration).await,
        None => {
            tracing::info!("Playing, press Ctrl-C to stop");
            tokio::signal::ctrl_c().await.map_err(anyhow::Error::from)
        }
    };

    player::release_player(&state).await?;
    result
}

async fn record(state: &PlayerState, name: String, duration: Option<u64>) -> anyhow::Result<()> {
    let snapshot = player::start_recording(state, name).await?;
    tracing::info!(
        "Recording to {:?}",
        snapshot.recording_file.unwrap_or_default()
    );

    let limit = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(limit);

    let mut progress = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = &mut limit => break,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            _ = progress.tick() => {
                tracing::info!("Recording {}", player::get_recording_duration(state).await);
            }
        }
    }

    let snapshot = player::stop_recording(state).await?;
    if let Some(message) = snapshot.message {
        tracing::info!("{}", message);
    }
    Ok(())
}
