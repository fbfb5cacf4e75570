//! Test doubles for the engine ports.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::output::{AudioOutput, PlayError, PlayFuture};

#[derive(Default)]
struct FakeState {
    loaded: HashSet<String>,
    playing: HashSet<String>,
    fractions: HashMap<String, f32>,
    /// Channels whose source fails to load
    missing: HashSet<String>,
    /// Channels whose play requests are refused
    rejecting: HashSet<String>,
    pauses: Vec<String>,
}

/// Recording audio output. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakeOutput {
    state: Arc<Mutex<FakeState>>,
}

impl FakeOutput {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn fail_load(&self, channel: &str) {
        self.state.lock().missing.insert(channel.to_string());
    }

    pub(crate) fn reject_play(&self, channel: &str) {
        self.state.lock().rejecting.insert(channel.to_string());
    }

    pub(crate) fn fraction(&self, channel: &str) -> Option<f32> {
        self.state.lock().fractions.get(channel).copied()
    }

    pub(crate) fn pauses(&self) -> Vec<String> {
        self.state.lock().pauses.clone()
    }
}

impl AudioOutput for FakeOutput {
    fn load(&mut self, channel: &str, _source: &str) -> bool {
        let mut state = self.state.lock();
        if state.missing.contains(channel) {
            return false;
        }
        state.loaded.insert(channel.to_string())
    }

    fn play(&mut self, channel: &str) -> PlayFuture {
        let mut state = self.state.lock();
        let outcome = if state.rejecting.contains(channel) {
            Err(PlayError::new("playback requires a user gesture"))
        } else {
            state.playing.insert(channel.to_string());
            Ok(())
        };
        async move { outcome }.boxed()
    }

    fn pause(&mut self, channel: &str) {
        let mut state = self.state.lock();
        state.playing.remove(channel);
        state.pauses.push(channel.to_string());
    }

    fn set_volume_fraction(&mut self, channel: &str, fraction: f32) {
        self.state.lock().fractions.insert(channel.to_string(), fraction);
    }

    fn is_playing(&self, channel: &str) -> bool {
        self.state.lock().playing.contains(channel)
    }
}
