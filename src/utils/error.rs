//! Error types and handling
//!
//! Common error types used across the application.

use crate::engine::EngineError;
use crate::session::SessionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Error response for callers of the command layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Session(SessionError::EmptySource) => "EMPTY_SOURCE",
            AppError::Session(SessionError::NotReady) => "NOT_READY",
            AppError::Session(SessionError::AlreadyRecording) => "ALREADY_RECORDING",
            AppError::Session(SessionError::NotRecording) => "NOT_RECORDING",
            AppError::Session(SessionError::RecordingInProgress) => "RECORDING_IN_PROGRESS",
            AppError::Session(SessionError::Engine(_)) | AppError::Engine(_) => "ENGINE_ERROR",
            AppError::Session(SessionError::Io(_)) => "IO_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<SessionError> for ErrorResponse {
    fn from(error: SessionError) -> Self {
        AppError::from(error).into()
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ErrorResponse {}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
