//! Error types for Ambimix core.

use thiserror::Error;

/// Core error type for Ambimix operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("A preset named {0:?} already exists")]
    DuplicateName(String),

    #[error("No active sounds to save")]
    EmptyMix,

    #[error("Invalid preset name: {0:?}")]
    InvalidPresetName(String),

    #[error("Invalid volume value: {0} (must be 0-100)")]
    InvalidVolume(u8),

    #[error("Playback rejected for {channel}: {reason}")]
    PlaybackRejected { channel: String, reason: String },
}

/// Result type alias for Ambimix core operations.
pub type Result<T> = std::result::Result<T, Error>;
