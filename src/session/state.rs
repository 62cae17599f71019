//! Session state management
//!
//! Defines the session state machine and the snapshot published to readers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current state of a viewing session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No playback in progress
    Idle,
    /// Stream is playing
    Playing,
    /// Stream is playing and being written to a file
    Recording,
    /// Engine released; terminal
    Released,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Immutable view of the session, published after every transition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub state: SessionState,

    /// Last source URL set by the caller
    pub current_url: String,

    pub is_playing: bool,

    pub is_recording: bool,

    /// Path of the current or most recent recording
    pub recording_file: Option<PathBuf>,

    /// User-facing status or result text
    pub message: Option<String>,

    /// Elapsed time of the running recording
    pub recording_duration_ms: u64,
}

impl SessionSnapshot {
    /// Recompute `state` from the flags
    pub(crate) fn sync_state(&mut self) {
        if self.state == SessionState::Released {
            return;
        }
        self.state = match (self.is_playing, self.is_recording) {
            (_, true) => SessionState::Recording,
            (true, false) => SessionState::Playing,
            (false, false) => SessionState::Idle,
        };
    }

    /// Formatted recording duration (`HH:MM:SS`)
    pub fn formatted_duration(&self) -> String {
        format_duration(self.recording_duration_ms)
    }
}

/// Events emitted by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PlaybackStarted { uri: String },
    PlaybackStopped,
    RecordingStarted { path: PathBuf },
    RecordingStopped { path: PathBuf },
    /// A failure surfaced to the user
    Error(String),
    Released,
}

/// Format milliseconds as `HH:MM:SS`
pub fn format_duration(duration_ms: u64) -> String {
    let total_seconds = duration_ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
