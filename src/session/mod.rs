//! Viewing session module
//!
//! This module implements the stream/recording session lifecycle:
//! - SessionController sequencing engine calls
//! - SessionSnapshot published to readers after every transition
//! - RecordingTimer tracking elapsed recording time

pub mod controller;
pub mod error;
pub mod recording;
pub mod state;
pub mod timer;

pub use controller::SessionController;
pub use error::{SessionError, SessionResult};
pub use state::{format_duration, SessionEvent, SessionSnapshot, SessionState};
