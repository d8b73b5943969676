//! Error types
//!
//! Nothing here is fatal to a presentation: audio errors are logged and the
//! timeline carries on, config errors fall back to defaults.

use thiserror::Error;

/// Failures reported by an audio backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    /// The host refused to start playback (autoplay policy, no user gesture yet)
    #[error("playback denied: {0}")]
    PlaybackDenied(String),
    /// The asset could not be created or is gone
    #[error("audio backend unavailable: {0}")]
    Unavailable(String),
}

/// Failures loading or validating [`crate::Settings`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
