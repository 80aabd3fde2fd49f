//! Error types for the Flipclock engine.
//!
//! None of these are fatal to the display. Audio and fullscreen failures are
//! logged and swallowed by the engine; only an invalid timer request is
//! returned to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlipclockError {
    /// A countdown was requested with a non-positive (or overflowing) length.
    #[error("invalid timer duration: {minutes} minute(s)")]
    InvalidDuration { minutes: u32 },

    /// The audio capability is missing or refused an operation.
    #[error("audio unavailable: {0}")]
    Audio(String),

    /// The host window rejected a fullscreen request.
    #[error("fullscreen request rejected: {0}")]
    Fullscreen(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, FlipclockError>;
