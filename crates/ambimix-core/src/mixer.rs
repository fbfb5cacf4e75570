//! Mixer state and effective volume computation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::channel::ChannelState;
use crate::error::{Error, Result};
use crate::preset::VolumeSnapshot;

/// Upper bound of every volume scale.
pub const MAX_VOLUME: u8 = 100;

/// Level a silent channel is raised to when turned on.
pub const RESUME_VOLUME: u8 = 50;

/// Effective output level on the 0-100 scale.
///
/// Integer floor of `volume * master / 100`, never rounded.
#[must_use]
pub fn effective_volume(volume: u8, master: u8) -> u8 {
    let scaled = u16::from(volume.min(MAX_VOLUME)) * u16::from(master.min(MAX_VOLUME)) / 100;
    u8::try_from(scaled).unwrap_or(MAX_VOLUME)
}

/// Effective output level as the 0.0 - 1.0 fraction handed to the audio output.
#[must_use]
pub fn effective_fraction(volume: u8, master: u8) -> f32 {
    f32::from(effective_volume(volume, master)) / 100.0
}

fn validate(volume: u8) -> Result<u8> {
    if volume > MAX_VOLUME {
        return Err(Error::InvalidVolume(volume));
    }
    Ok(volume)
}

/// Outcome of toggling a single channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Toggle {
    /// Channel turned on; start playback at this level
    Play { volume: u8, fraction: f32 },
    /// Channel turned off; pause playback
    Pause,
}

/// A channel switched on by a bulk operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub channel: String,
    pub volume: u8,
    pub fraction: f32,
}

/// State of the overall mixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerState {
    /// Per-channel state, in catalog order
    channels: Vec<ChannelState>,
    /// Master volume (0 - 100)
    master_volume: u8,
}

impl MixerState {
    /// Create a mixer with one silent channel per catalog entry.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self::with_channels(catalog.channels().iter().map(|c| c.id.as_str()))
    }

    /// Create a mixer for an explicit list of channel ids.
    pub fn with_channels<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self { channels: ids.into_iter().map(ChannelState::new).collect(), master_volume: MAX_VOLUME }
    }

    fn find(&self, id: &str) -> Result<&ChannelState> {
        self.channels.iter().find(|c| c.id == id).ok_or_else(|| Error::UnknownChannel(id.to_string()))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut ChannelState> {
        self.channels
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::UnknownChannel(id.to_string()))
    }

    /// Get the state of a channel.
    #[must_use]
    pub fn channel(&self, id: &str) -> Option<&ChannelState> {
        self.find(id).ok()
    }

    /// All channel states, in catalog order.
    #[must_use]
    pub fn channels(&self) -> &[ChannelState] {
        &self.channels
    }

    /// Whether the channel id is part of this mixer.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.channels.iter().any(|c| c.id == id)
    }

    /// Current master volume.
    #[must_use]
    pub fn master_volume(&self) -> u8 {
        self.master_volume
    }

    /// Store a channel's individual volume and return its effective fraction.
    ///
    /// The play flag is left untouched.
    ///
    /// # Errors
    /// Returns `InvalidVolume` above 100 and `UnknownChannel` for ids outside the catalog.
    pub fn set_channel_volume(&mut self, id: &str, volume: u8) -> Result<f32> {
        let volume = validate(volume)?;
        let master = self.master_volume;
        let channel = self.find_mut(id)?;
        channel.volume = volume;
        debug!(channel = %id, volume, "Channel volume stored");
        Ok(effective_fraction(volume, master))
    }

    /// Flip a channel between playing and stopped.
    ///
    /// Turning a channel on raises a stored volume of 0 to [`RESUME_VOLUME`].
    /// Turning it off clears the stored volume to 0.
    ///
    /// # Errors
    /// Returns `UnknownChannel` for ids outside the catalog.
    pub fn toggle_channel(&mut self, id: &str) -> Result<Toggle> {
        let master = self.master_volume;
        let channel = self.find_mut(id)?;

        if channel.playing {
            channel.playing = false;
            channel.volume = 0;
            debug!(channel = %id, "Channel turned off");
            return Ok(Toggle::Pause);
        }

        if channel.volume == 0 {
            channel.volume = RESUME_VOLUME;
        }
        channel.playing = true;
        debug!(channel = %id, volume = channel.volume, "Channel turned on");
        Ok(Toggle::Play { volume: channel.volume, fraction: effective_fraction(channel.volume, master) })
    }

    /// Update the master volume and return the new fractions of every playing channel.
    ///
    /// # Errors
    /// Returns `InvalidVolume` above 100.
    pub fn set_master_volume(&mut self, volume: u8) -> Result<Vec<(String, f32)>> {
        self.master_volume = validate(volume)?;

        Ok(self
            .channels
            .iter()
            .filter(|c| c.playing)
            .map(|c| (c.id.clone(), effective_fraction(c.volume, volume)))
            .collect())
    }

    /// Turn on every channel for which `level_of` reports a level.
    ///
    /// A reported level of 0 is raised to [`RESUME_VOLUME`]; levels above 100 are capped.
    pub fn play_all(&mut self, level_of: impl Fn(&str) -> Option<u8>) -> Vec<Activation> {
        let master = self.master_volume;
        let mut activated = Vec::new();

        for channel in &mut self.channels {
            let Some(level) = level_of(&channel.id) else {
                continue;
            };

            let volume = match level {
                0 => RESUME_VOLUME,
                level if level > MAX_VOLUME => {
                    warn!(channel = %channel.id, level, "Level out of range, capping");
                    MAX_VOLUME
                }
                level => level,
            };

            channel.volume = volume;
            channel.playing = true;
            activated.push(Activation {
                channel: channel.id.clone(),
                volume,
                fraction: effective_fraction(volume, master),
            });
        }

        activated
    }

    /// Turn off every playing channel, clearing its stored volume.
    pub fn pause_all(&mut self) -> Vec<String> {
        self.channels
            .iter_mut()
            .filter(|c| c.playing)
            .map(|c| {
                c.playing = false;
                c.volume = 0;
                c.id.clone()
            })
            .collect()
    }

    /// Stop every playing channel but keep its stored volume.
    pub fn suspend_all(&mut self) -> Vec<String> {
        self.channels
            .iter_mut()
            .filter(|c| c.playing)
            .map(|c| {
                c.playing = false;
                c.id.clone()
            })
            .collect()
    }

    /// Stop and zero every channel, returning the ids that were playing.
    ///
    /// The master volume is left untouched.
    pub fn stop_all(&mut self) -> Vec<String> {
        let mut stopped = Vec::new();
        for channel in &mut self.channels {
            if channel.playing {
                stopped.push(channel.id.clone());
            }
            channel.playing = false;
            channel.volume = 0;
        }
        stopped
    }

    /// Stop and zero a single channel.
    ///
    /// # Errors
    /// Returns `UnknownChannel` for ids outside the catalog.
    pub fn stop_channel(&mut self, id: &str) -> Result<()> {
        let channel = self.find_mut(id)?;
        channel.playing = false;
        channel.volume = 0;
        Ok(())
    }

    /// Restore defaults: master 100, every channel silent and stopped.
    pub fn reset_all(&mut self) {
        self.master_volume = MAX_VOLUME;
        for channel in &mut self.channels {
            channel.volume = 0;
            channel.playing = false;
        }
    }

    /// Whether at least one channel is playing.
    #[must_use]
    pub fn is_any_playing(&self) -> bool {
        self.channels.iter().any(|c| c.playing)
    }

    /// Current individual volumes keyed by channel id.
    #[must_use]
    pub fn snapshot(&self) -> VolumeSnapshot {
        self.channels.iter().map(|c| (c.id.clone(), c.volume)).collect()
    }
}
