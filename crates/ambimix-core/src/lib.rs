//! Ambimix Core - Channel catalog, mixer state, presets, and countdown timer.
//!
//! This crate contains the domain models shared by the preset store, the
//! session engine, and the daemon.

pub mod catalog;
pub mod channel;
pub mod command;
pub mod error;
pub mod mixer;
pub mod preset;
pub mod state;
pub mod timer;

pub use catalog::Catalog;
pub use channel::{ChannelConfig, ChannelState};
pub use command::Command;
pub use error::{Error, Result};
pub use mixer::{Activation, MixerState, Toggle};
pub use preset::{BuiltinPreset, Preset, PresetSummary, VolumeSnapshot};
pub use state::{Notification, SessionSnapshot};
pub use timer::{CountdownTimer, TimerEvent, TimerState};
