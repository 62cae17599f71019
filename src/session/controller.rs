//! Session controller
//!
//! Sequences media engine calls into a small state machine and hides the
//! engine's resource lifetime rules from callers: lazy engine creation,
//! single attach, exactly-once media release, and guaranteed teardown.

use super::error::{SessionError, SessionResult};
use super::recording::recording_path;
use super::state::{SessionEvent, SessionSnapshot, SessionState};
use super::timer::RecordingTimer;
use crate::config::{PlayWhileRecording, PlayerConfig};
use crate::engine::{DisplaySurface, EngineHandle, EngineResult, MediaEngine, MediaOptions, MediaRef};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Owns one engine handle and drives it through the session lifecycle.
///
/// All mutating operations take `&mut self`; callers that share a
/// controller must serialize access (see `commands::player::PlayerState`).
pub struct SessionController {
    engine: Box<dyn MediaEngine>,

    config: PlayerConfig,

    /// Created lazily on first attach, released once
    handle: Option<EngineHandle>,

    /// Id of the attached surface
    surface: Option<u64>,

    /// Media reference currently owned by the session
    media: Option<MediaRef>,

    released: bool,

    timer: RecordingTimer,

    snapshot_tx: Arc<watch::Sender<SessionSnapshot>>,

    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(engine: Box<dyn MediaEngine>, config: PlayerConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        let (event_tx, _) = broadcast::channel(64);
        tracing::debug!("Session created with {} engine", engine.name());
        Self {
            engine,
            config,
            handle: None,
            surface: None,
            media: None,
            released: false,
            timer: RecordingTimer::new(),
            snapshot_tx: Arc::new(snapshot_tx),
            event_tx,
        }
    }

    /// Current published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.snapshot_tx.borrow().state
    }

    /// Subscribe to snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Subscribe to session events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.config.recordings_dir
    }

    /// Recording duration as `HH:MM:SS`
    pub fn formatted_duration(&self) -> String {
        self.snapshot_tx.borrow().formatted_duration()
    }

    /// Record the candidate source URL
    pub fn set_source(&mut self, uri: &str) {
        if self.ignore_after_release("set_source") {
            return;
        }
        self.publish(|s| s.current_url = uri.to_string());
    }

    /// Bind a display surface, creating the engine on first use
    pub fn attach_view(&mut self, view: &DisplaySurface) -> SessionResult<()> {
        if self.ignore_after_release("attach_view") {
            return Ok(());
        }
        if self.surface == Some(view.id) {
            tracing::debug!("Surface '{}' already attached", view.label);
            return Ok(());
        }

        let result = self.bind_surface(view);
        if let Err(e) = &result {
            self.report("Attach failed", e);
        }
        result.map_err(SessionError::from)
    }

    fn bind_surface(&mut self, view: &DisplaySurface) -> EngineResult<()> {
        let handle = match self.handle {
            Some(handle) => handle,
            None => {
                let handle = self.engine.create_engine(&self.config.engine_flags)?;
                tracing::info!("Created {} engine {:?}", self.engine.name(), handle);
                self.handle = Some(handle);
                handle
            }
        };

        if let Some(previous) = self.surface {
            self.engine.detach(handle)?;
            self.surface = None;
            tracing::debug!("Detached surface {}", previous);
        }

        self.engine.attach(handle, view)?;
        self.surface = Some(view.id);
        tracing::info!("Video surface '{}' attached", view.label);
        Ok(())
    }

    /// Play `uri`, replacing whatever is currently playing
    pub fn play(&mut self, uri: &str) -> SessionResult<()> {
        if self.ignore_after_release("play") {
            return Ok(());
        }
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(SessionError::EmptySource);
        }
        let handle = self.ready_handle()?;

        let recording = self.snapshot_tx.borrow().is_recording;
        if recording {
            match self.config.play_while_recording {
                PlayWhileRecording::Reject => {
                    tracing::warn!("Ignoring play of {} while recording", uri);
                    return Err(SessionError::RecordingInProgress);
                }
                PlayWhileRecording::StopRecording => {
                    tracing::info!("Play requested while recording, finalizing recording first");
                    if let Err(e) = self.stop_recording() {
                        tracing::warn!("Recording did not stop cleanly: {}", e);
                    }
                }
            }
        }

        self.halt(handle);

        let options = MediaOptions::playback(
            self.config.hardware_decoding,
            self.config.network_caching_ms,
        )
        .to_options();

        match self.start_media(handle, uri, &options) {
            Ok(media) => {
                self.media = Some(media);
                self.publish(|s| {
                    s.current_url = uri.to_string();
                    s.is_playing = true;
                    s.is_recording = false;
                });
                self.emit(SessionEvent::PlaybackStarted {
                    uri: uri.to_string(),
                });
                tracing::info!("Playing stream: {}", uri);
                Ok(())
            }
            Err(e) => {
                self.publish(|s| {
                    s.is_playing = false;
                    s.is_recording = false;
                });
                self.report("Play failed", &e);
                Err(e.into())
            }
        }
    }

    /// Stop playback. Ends a running recording as well.
    pub fn stop(&mut self) -> SessionResult<()> {
        if self.ignore_after_release("stop") {
            return Ok(());
        }
        let snapshot = self.snapshot();
        if !snapshot.is_playing {
            tracing::debug!("Stop ignored, nothing is playing");
            return Ok(());
        }

        if let Some(handle) = self.handle {
            self.halt(handle);
        } else {
            tracing::warn!("Stop attempted without an engine");
        }

        if snapshot.is_recording {
            self.timer.cancel();
        }

        let saved = snapshot
            .recording_file
            .as_ref()
            .filter(|_| snapshot.is_recording)
            .map(|path| path.display().to_string());

        self.publish(|s| {
            s.is_playing = false;
            s.is_recording = false;
            s.recording_duration_ms = 0;
            if let Some(path) = &saved {
                s.message = Some(format!("Saved to: {}", path));
            }
        });

        if let (true, Some(path)) = (snapshot.is_recording, snapshot.recording_file) {
            tracing::info!("Recording stopped with stream: {:?}", path);
            self.emit(SessionEvent::RecordingStopped { path });
        }
        self.emit(SessionEvent::PlaybackStopped);
        tracing::info!("Stream stopped");
        Ok(())
    }

    /// Restart `uri` with a copy written to `<recordings_dir>/<output_name>-<millis>.<container>`
    pub fn start_recording(&mut self, uri: &str, output_name: &str) -> SessionResult<()> {
        if self.ignore_after_release("start_recording") {
            return Ok(());
        }
        if self.snapshot_tx.borrow().is_recording {
            return Err(SessionError::AlreadyRecording);
        }
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(SessionError::EmptySource);
        }
        let handle = self.ready_handle()?;

        let path = recording_path(
            &self.config.recordings_dir,
            output_name,
            &self.config.container,
        );
        // Published before the engine starts so failures can still report it
        self.publish(|s| s.recording_file = Some(path.clone()));

        if let Err(e) = fs::create_dir_all(&self.config.recordings_dir) {
            self.publish(|s| s.is_recording = false);
            self.report("Recording failed", &e);
            return Err(e.into());
        }

        self.halt(handle);

        let options = MediaOptions::playback(
            self.config.hardware_decoding,
            self.config.network_caching_ms,
        )
        .with_file_sink(&path, &self.config.container)
        .to_options();

        match self.start_media(handle, uri, &options) {
            Ok(media) => {
                self.media = Some(media);
                self.timer
                    .start(self.snapshot_tx.clone(), self.config.timer_interval());
                self.publish(|s| {
                    s.current_url = uri.to_string();
                    s.is_playing = true;
                    s.is_recording = true;
                    s.recording_duration_ms = 0;
                });
                self.emit(SessionEvent::RecordingStarted { path: path.clone() });
                tracing::info!("Recording started: {:?}", path);
                Ok(())
            }
            Err(e) => {
                self.publish(|s| {
                    s.is_playing = false;
                    s.is_recording = false;
                });
                self.report("Recording failed", &e);
                Err(e.into())
            }
        }
    }

    /// Finalize the running recording and return to idle
    pub fn stop_recording(&mut self) -> SessionResult<()> {
        if self.ignore_after_release("stop_recording") {
            return Ok(());
        }
        let snapshot = self.snapshot();
        if !snapshot.is_recording {
            return Err(SessionError::NotRecording);
        }
        let handle = self.handle.ok_or(SessionError::NotReady)?;

        self.timer.cancel();
        let result = self.rebuild_plain_media(handle, &snapshot.current_url);

        let path = snapshot.recording_file.clone().unwrap_or_default();
        match result {
            Ok(()) => {
                self.publish(|s| {
                    s.is_playing = false;
                    s.is_recording = false;
                    s.recording_duration_ms = 0;
                    s.message = Some(format!("Saved to: {}", path.display()));
                });
                self.emit(SessionEvent::RecordingStopped { path: path.clone() });
                tracing::info!("Recording saved to {:?}", path);
                Ok(())
            }
            Err(e) => {
                self.publish(|s| {
                    s.is_playing = false;
                    s.is_recording = false;
                    s.recording_duration_ms = 0;
                });
                self.report("Stop failed", &e);
                Err(e.into())
            }
        }
    }

    pub fn clear_message(&mut self) {
        if self.ignore_after_release("clear_message") {
            return;
        }
        self.publish(|s| s.message = None);
    }

    /// Tear down every engine resource. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            tracing::debug!("Session already released");
            return;
        }

        self.timer.cancel();

        if let Some(handle) = self.handle.take() {
            if self.snapshot_tx.borrow().is_playing {
                if let Err(e) = self.engine.stop(handle) {
                    tracing::warn!("Failed to stop engine during release: {}", e);
                }
            }
            self.release_media();
            if self.surface.take().is_some() {
                if let Err(e) = self.engine.detach(handle) {
                    tracing::warn!("Failed to detach surface during release: {}", e);
                }
            }
            if let Err(e) = self.engine.release_engine(handle) {
                tracing::error!("Failed to release engine: {}", e);
            }
        }

        self.released = true;
        self.publish(|s| {
            s.state = SessionState::Released;
            s.is_playing = false;
            s.is_recording = false;
            s.recording_duration_ms = 0;
        });
        self.emit(SessionEvent::Released);
        tracing::info!("Player and engine released");
    }

    fn ignore_after_release(&self, operation: &str) -> bool {
        if self.released {
            tracing::warn!("{} called after release, ignoring", operation);
        }
        self.released
    }

    fn ready_handle(&self) -> SessionResult<EngineHandle> {
        match (self.handle, self.surface) {
            (Some(handle), Some(_)) => Ok(handle),
            _ => Err(SessionError::NotReady),
        }
    }

    /// Stop in-flight playback and free the current media reference
    fn halt(&mut self, handle: EngineHandle) {
        if self.snapshot_tx.borrow().is_playing {
            if let Err(e) = self.engine.stop(handle) {
                tracing::warn!("Engine stop failed: {}", e);
            }
        }
        self.release_media();
    }

    fn release_media(&mut self) {
        if let Some(media) = self.media.take() {
            if let Err(e) = self.engine.release_media(media) {
                tracing::warn!("Failed to release media {:?}: {}", media, e);
            }
        }
    }

    /// Create, set and play a media reference. The reference is released on failure.
    fn start_media(
        &mut self,
        handle: EngineHandle,
        uri: &str,
        options: &[String],
    ) -> EngineResult<MediaRef> {
        let media = self.engine.create_media(handle, uri, options)?;
        let started = self
            .engine
            .set_media(handle, media)
            .and_then(|()| self.engine.play(handle));
        if let Err(e) = started {
            if let Err(release_err) = self.engine.release_media(media) {
                tracing::warn!("Failed to release rejected media: {}", release_err);
            }
            return Err(e);
        }
        Ok(media)
    }

    /// Stop the recording pipeline and leave a plain media reference set
    fn rebuild_plain_media(&mut self, handle: EngineHandle, uri: &str) -> EngineResult<()> {
        self.engine.stop(handle)?;
        self.release_media();

        let options = MediaOptions::playback(
            self.config.hardware_decoding,
            self.config.network_caching_ms,
        )
        .to_options();
        let media = self.engine.create_media(handle, uri, &options)?;
        if let Err(e) = self.engine.set_media(handle, media) {
            if let Err(release_err) = self.engine.release_media(media) {
                tracing::warn!("Failed to release unused media: {}", release_err);
            }
            return Err(e);
        }
        self.media = Some(media);
        Ok(())
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) {
        self.snapshot_tx.send_modify(|snapshot| {
            update(snapshot);
            snapshot.sync_state();
        });
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    fn report(&self, context: &str, error: &dyn std::fmt::Display) {
        let message = format!("{}: {}", context, error);
        tracing::error!("{}", message);
        self.publish(|s| s.message = Some(message.clone()));
        self.emit(SessionEvent::Error(message));
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.release();
    }
}
