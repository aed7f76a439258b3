//! Error types for the streaming core
use thiserror::Error;

use crate::hue::api::error::HueError;
use crate::hue::command::ParseError;
use crate::hue::stream::manager::StreamError;
use crate::hue::stream::protocol::FrameError;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// Malformed command text
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Frame encoding precondition violated
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Streaming loop terminated with an error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Bridge HTTP API error
    #[error("Hue error: {0}")]
    Hue(#[from] HueError),

    /// Session cannot be built from the given configuration
    #[error("Invalid session: {0}")]
    InvalidSession(String),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
