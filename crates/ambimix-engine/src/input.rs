//! User-visible level input.
//!
//! Turning a channel off clears the mixer's stored volume, so resuming it
//! reads the level the user last left on that channel's slider instead.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Source of the last level the user set for a channel.
pub trait LevelInput {
    /// Level in 0 - 100, or `None` if the channel has no control.
    fn level(&self, channel: &str) -> Option<u8>;

    /// Remember a level the session applied to a channel, before it is announced.
    fn record(&self, channel: &str, level: u8);
}

/// Shared slider positions.
///
/// Clones share state: a UI keeps one clone and moves sliders through it while
/// the session reads and records through another. Channels never written read as 0.
#[derive(Debug, Clone, Default)]
pub struct SliderLevels {
    levels: Arc<RwLock<HashMap<String, u8>>>,
}

impl SliderLevels {
    /// Create sliders that all sit at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a slider.
    pub fn set(&self, channel: &str, level: u8) {
        self.levels.write().insert(channel.to_string(), level);
    }

    /// Current slider position.
    #[must_use]
    pub fn get(&self, channel: &str) -> u8 {
        self.levels.read().get(channel).copied().unwrap_or(0)
    }
}

impl LevelInput for SliderLevels {
    fn level(&self, channel: &str) -> Option<u8> {
        Some(self.get(channel))
    }

    fn record(&self, channel: &str, level: u8) {
        self.set(channel, level);
    }
}
