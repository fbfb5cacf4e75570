//! Commands for session mutations.
//!
//! Commands are sent to the session runtime, which applies them one at a
//! time with exclusive access to the mixer, preset store, and timer.

use serde::{Deserialize, Serialize};

/// A request to change session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "command")]
pub enum Command {
    /// Turn a channel on or off
    ToggleChannel { channel: String },
    /// Set a channel's individual volume
    SetChannelVolume { channel: String, volume: u8 },
    /// Set the master volume
    SetMasterVolume { volume: u8 },
    /// Pause everything if anything plays, otherwise resume every channel
    ToggleAll,
    /// Save the current mix under a new name
    SaveCurrentMix { name: String },
    /// Apply a builtin or custom preset
    ApplyPreset { id: String, custom: bool },
    /// Delete a custom preset
    DeletePreset { id: String },
    /// Start the sleep timer
    StartTimer { minutes: i64 },
    /// Cancel the sleep timer
    StopTimer,
    /// Restore defaults
    ResetAll,
    /// Stop the session runtime
    Shutdown,
}
