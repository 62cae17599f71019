use crate::engine::EngineError;
use thiserror::Error;

/// Errors from session operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Stream URL is empty")]
    EmptySource,

    #[error("Player not ready: no video surface attached")]
    NotReady,

    #[error("Already recording")]
    AlreadyRecording,

    #[error("Not recording")]
    NotRecording,

    #[error("A recording is in progress; stop it before playing another stream")]
    RecordingInProgress,

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;
