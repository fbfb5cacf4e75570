//! Session notifications and snapshots.

use serde::{Deserialize, Serialize};

use crate::channel::ChannelState;
use crate::preset::PresetSummary;
use crate::timer::TimerState;

/// Presentation notification published by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "data")]
pub enum Notification {
    ChannelVolumeChanged { channel: String, volume: u8 },
    ChannelPlayStateChanged { channel: String, playing: bool },
    MasterVolumeChanged { volume: u8 },
    /// Aggregate play/pause indicator changed
    AnyPlayingChanged { playing: bool },
    TimerTick { minutes: u32, seconds: u32 },
    TimerCompleted,
    PresetAdded { id: String, name: String },
    PresetRemoved { id: String },
    ActivePresetChanged { id: Option<String> },
}

/// Complete snapshot of the session's current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Channel states, in catalog order
    pub channels: Vec<ChannelState>,
    /// Master volume
    pub master_volume: u8,
    /// Whether any channel is playing
    pub any_playing: bool,
    /// Sleep timer state
    pub timer: TimerState,
    /// Most recently applied preset
    pub active_preset: Option<String>,
    /// Builtin presets followed by custom presets
    pub presets: Vec<PresetSummary>,
}
