//! Log-only audio output.
//!
//! Stands in for a platform player: it tracks what would be playing and at
//! which level, and reports every change through tracing.

use std::collections::{HashMap, HashSet};

use ambimix_engine::{AudioOutput, PlayError, PlayFuture};
use futures::FutureExt;
use futures::future;
use tracing::{debug, info, warn};

/// Audio output that only logs.
#[derive(Debug, Default)]
pub struct LogOutput {
    sources: HashMap<String, String>,
    playing: HashSet<String>,
    fractions: HashMap<String, f32>,
}

impl LogOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioOutput for LogOutput {
    fn load(&mut self, channel: &str, source: &str) -> bool {
        if source.is_empty() {
            warn!(channel = %channel, "Empty source locator");
            return false;
        }
        debug!(channel = %channel, source = %source, "Source registered");
        self.sources.insert(channel.to_string(), source.to_string());
        true
    }

    fn play(&mut self, channel: &str) -> PlayFuture {
        let outcome = match self.sources.get(channel) {
            Some(source) => {
                let fraction = self.fractions.get(channel).copied().unwrap_or(1.0);
                info!(channel = %channel, source = %source, fraction, "Playing");
                self.playing.insert(channel.to_string());
                Ok(())
            }
            None => Err(PlayError::new(format!("no source loaded for {channel}"))),
        };
        future::ready(outcome).boxed()
    }

    fn pause(&mut self, channel: &str) {
        if self.playing.remove(channel) {
            info!(channel = %channel, "Paused");
        }
    }

    fn set_volume_fraction(&mut self, channel: &str, fraction: f32) {
        debug!(channel = %channel, fraction, "Level");
        self.fractions.insert(channel.to_string(), fraction);
    }

    fn is_playing(&self, channel: &str) -> bool {
        self.playing.contains(channel)
    }
}
