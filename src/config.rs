//! Player configuration
//!
//! Loaded from a JSON file; every field falls back to its default when
//! missing.

use crate::engine::options::{
    default_engine_flags, DEFAULT_NETWORK_CACHING_MS, RECORDING_CONTAINERS,
};
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What `play` does while a recording is running
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayWhileRecording {
    /// Finalize the recording, then play the new source normally
    #[default]
    StopRecording,
    /// Refuse to play; the recording keeps running
    Reject,
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerConfig {
    /// Flags passed to the engine when it is created
    pub engine_flags: Vec<String>,

    /// Network buffering latency in milliseconds
    pub network_caching_ms: u32,

    /// Prefer hardware decoding
    pub hardware_decoding: bool,

    /// Directory recordings are written to
    pub recordings_dir: PathBuf,

    /// Recording file extension, one of `RECORDING_CONTAINERS`
    pub container: String,

    pub play_while_recording: PlayWhileRecording,

    /// Recording duration refresh interval
    pub timer_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            engine_flags: default_engine_flags(),
            network_caching_ms: DEFAULT_NETWORK_CACHING_MS,
            hardware_decoding: true,
            recordings_dir: default_recordings_dir(),
            container: "mp4".to_string(),
            play_while_recording: PlayWhileRecording::default(),
            timer_interval_ms: 1000,
        }
    }
}

impl PlayerConfig {
    /// Read configuration from a JSON file
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!("Loaded player config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if !RECORDING_CONTAINERS.contains(&self.container.as_str()) {
            return Err(AppError::Config(format!(
                "unsupported container '{}', expected one of {}",
                self.container,
                RECORDING_CONTAINERS.join(", ")
            )));
        }
        if self.timer_interval_ms == 0 {
            return Err(AppError::Config(
                "timerIntervalMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timer_interval(&self) -> Duration {
        Duration::from_millis(self.timer_interval_ms)
    }
}

/// App-private storage for recordings
pub fn default_recordings_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("rtsp-viewer")
        .join("recordings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PlayerConfig::default();
        assert_eq!(config.network_caching_ms, 300);
        assert!(config.engine_flags.contains(&"--rtsp-tcp".to_string()));
        assert_eq!(config.play_while_recording, PlayWhileRecording::StopRecording);
        assert!(config.recordings_dir.ends_with("rtsp-viewer/recordings"));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        fs::write(
            &path,
            r#"{ "networkCachingMs": 1000, "playWhileRecording": "reject", "recordingsDir": "/srv/rec" }"#,
        )
        .unwrap();

        let config = PlayerConfig::load(&path).unwrap();
        assert_eq!(config.network_caching_ms, 1000);
        assert_eq!(config.play_while_recording, PlayWhileRecording::Reject);
        assert_eq!(config.recordings_dir, PathBuf::from("/srv/rec"));
        assert_eq!(config.container, "mp4");
        assert_eq!(config.timer_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_recording_containers_validate() {
        for container in RECORDING_CONTAINERS {
            let config = PlayerConfig {
                container: container.to_string(),
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{}", container);
        }
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        fs::write(&path, r#"{ "timerIntervalMs": 0 }"#).unwrap();
        assert!(matches!(PlayerConfig::load(&path), Err(AppError::Config(_))));

        fs::write(&path, r#"{ "container": "avi" }"#).unwrap();
        assert!(matches!(PlayerConfig::load(&path), Err(AppError::Config(_))));

        fs::write(&path, r#"{ "container": "" }"#).unwrap();
        assert!(matches!(PlayerConfig::load(&path), Err(AppError::Config(_))));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            PlayerConfig::load(&path),
            Err(AppError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = PlayerConfig::load(Path::new("/nonexistent/player.json"));
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
