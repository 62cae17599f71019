//! Player commands
//!
//! One function per screen control. The controller is shared behind a
//! mutex so that engine calls never overlap, and each call runs on the
//! blocking pool because engine operations may wait on native resources.

use crate::config::PlayerConfig;
use crate::engine::{DisplaySurface, MediaEngine};
use crate::session::{SessionController, SessionError, SessionSnapshot};
use crate::utils::error::ErrorResponse;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state for the player screen
pub struct PlayerState {
    pub controller: Arc<Mutex<SessionController>>,
}

impl PlayerState {
    pub fn new(engine: Box<dyn MediaEngine>, config: PlayerConfig) -> Self {
        Self {
            controller: Arc::new(Mutex::new(SessionController::new(engine, config))),
        }
    }
}

async fn with_controller<T, F>(state: &PlayerState, op: F) -> Result<T, ErrorResponse>
where
    F: FnOnce(&mut SessionController) -> Result<T, SessionError> + Send + 'static,
    T: Send + 'static,
{
    let controller = state.controller.clone();
    tokio::task::spawn_blocking(move || {
        let mut guard = controller.blocking_lock();
        op(&mut *guard)
    })
    .await
    .map_err(|e| {
        tracing::error!("Player task panicked: {}", e);
        ErrorResponse {
            code: "TASK_FAILED".to_string(),
            message: format!("Player task panicked: {}", e),
        }
    })?
    .map_err(ErrorResponse::from)
}

/// Update the URL in the source field
pub async fn set_rtsp_url(state: &PlayerState, url: String) {
    state.controller.lock().await.set_source(&url);
}

/// Bind the video surface
pub async fn attach_video_surface(
    state: &PlayerState,
    surface: DisplaySurface,
) -> Result<(), ErrorResponse> {
    with_controller(state, move |c| c.attach_view(&surface)).await
}

/// Play button
pub async fn play_stream(state: &PlayerState, url: String) -> Result<SessionSnapshot, ErrorResponse> {
    with_controller(state, move |c| {
        c.play(&url)?;
        Ok(c.snapshot())
    })
    .await
}

/// Stop button
pub async fn stop_stream(state: &PlayerState) -> Result<SessionSnapshot, ErrorResponse> {
    with_controller(state, |c| {
        c.stop()?;
        Ok(c.snapshot())
    })
    .await
}

/// Start recording the URL currently in the source field
pub async fn start_recording(
    state: &PlayerState,
    output_name: String,
) -> Result<SessionSnapshot, ErrorResponse> {
    with_controller(state, move |c| {
        let url = c.snapshot().current_url;
        c.start_recording(&url, &output_name)?;
        Ok(c.snapshot())
    })
    .await
}

pub async fn stop_recording(state: &PlayerState) -> Result<SessionSnapshot, ErrorResponse> {
    with_controller(state, |c| {
        c.stop_recording()?;
        Ok(c.snapshot())
    })
    .await
}

/// Rec / Stop Rec button
pub async fn toggle_recording(
    state: &PlayerState,
    output_name: String,
) -> Result<SessionSnapshot, ErrorResponse> {
    with_controller(state, move |c| {
        let snapshot = c.snapshot();
        if snapshot.is_recording {
            c.stop_recording()?;
        } else {
            c.start_recording(&snapshot.current_url, &output_name)?;
        }
        Ok(c.snapshot())
    })
    .await
}

pub async fn get_session_snapshot(state: &PlayerState) -> SessionSnapshot {
    state.controller.lock().await.snapshot()
}

/// Recording duration as `HH:MM:SS`
pub async fn get_recording_duration(state: &PlayerState) -> String {
    state.controller.lock().await.formatted_duration()
}

pub async fn clear_recording_message(state: &PlayerState) {
    state.controller.lock().await.clear_message();
}

/// Back navigation: free every engine resource
pub async fn release_player(state: &PlayerState) -> Result<(), ErrorResponse> {
    with_controller(state, |c| {
        c.release();
        Ok(())
    })
    .await
}
