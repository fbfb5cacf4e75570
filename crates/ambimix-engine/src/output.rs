//! Audio output port.
//!
//! The engine never touches audio samples. It drives a platform player
//! through this trait: load a looping source per channel, then start, pause,
//! and scale it.

use futures::future::BoxFuture;
use thiserror::Error;

/// Reason the platform refused to start playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PlayError(pub String);

impl PlayError {
    /// Create a play error from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Deferred outcome of a play request.
pub type PlayFuture = BoxFuture<'static, Result<(), PlayError>>;

/// Platform audio playback.
pub trait AudioOutput {
    /// Prepare a looping source for a channel. Returns whether it loaded.
    fn load(&mut self, channel: &str, source: &str) -> bool;

    /// Start playback. Resolves once the platform accepted or refused.
    fn play(&mut self, channel: &str) -> PlayFuture;

    /// Pause playback.
    fn pause(&mut self, channel: &str);

    /// Set the output level, 0.0 - 1.0.
    fn set_volume_fraction(&mut self, channel: &str, fraction: f32);

    /// Whether the platform reports the channel as playing.
    fn is_playing(&self, channel: &str) -> bool;
}
