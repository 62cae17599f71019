//! Media engine abstraction
//!
//! The engine is the external collaborator that does the real work:
//! stream negotiation, decoding, rendering and muxing. This module only
//! describes the handle-based surface the session layer drives:
//! - `MediaEngine` trait implemented by concrete backends
//! - Opaque `EngineHandle` / `MediaRef` resources
//! - `DisplaySurface` the engine renders into

pub mod ffmpeg;
pub mod options;

#[cfg(test)]
pub(crate) mod mock;

pub use ffmpeg::FfmpegEngine;
pub use options::MediaOptions;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle to one engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineHandle(pub u64);

/// Opaque reference to one configured playable source.
///
/// Media references are not garbage-collected by the engine and must be
/// released exactly once with [`MediaEngine::release_media`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef(pub u64);

/// A display surface the engine can render into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySurface {
    /// Identity of the surface; two surfaces with the same id are the same view
    pub id: u64,

    /// Human-readable label, used for logging only
    pub label: String,
}

impl DisplaySurface {
    pub fn new(id: u64, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

/// Errors reported by an engine backend
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown engine handle: {0}")]
    UnknownEngine(u64),

    #[error("Unknown media reference: {0}")]
    UnknownMedia(u64),

    #[error("No media set on engine {0}")]
    NoMedia(u64),

    #[error("Engine rejected request: {0}")]
    Rejected(String),

    #[error("Failed to start engine process: {0}")]
    Spawn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Handle-based media engine.
///
/// Implementations are not expected to tolerate concurrent calls on the
/// same handle; callers serialize access.
pub trait MediaEngine: Send {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Create an engine instance configured with command-line style flags
    fn create_engine(&mut self, options: &[String]) -> EngineResult<EngineHandle>;

    /// Bind a display surface. Engines do not tolerate double-attach.
    fn attach(&mut self, engine: EngineHandle, surface: &DisplaySurface) -> EngineResult<()>;

    /// Unbind the current display surface
    fn detach(&mut self, engine: EngineHandle) -> EngineResult<()>;

    /// Create a media reference for `uri` with per-media options
    fn create_media(
        &mut self,
        engine: EngineHandle,
        uri: &str,
        options: &[String],
    ) -> EngineResult<MediaRef>;

    /// Make `media` the source for the next `play`
    fn set_media(&mut self, engine: EngineHandle, media: MediaRef) -> EngineResult<()>;

    fn play(&mut self, engine: EngineHandle) -> EngineResult<()>;

    fn stop(&mut self, engine: EngineHandle) -> EngineResult<()>;

    fn release_media(&mut self, media: MediaRef) -> EngineResult<()>;

    fn release_engine(&mut self, engine: EngineHandle) -> EngineResult<()>;
}
