//! Ambient channel definitions and state.

use serde::{Deserialize, Serialize};

/// Catalog entry for an ambient sound channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Stable identifier (e.g., "rain", "ocean", "cafe")
    pub id: String,
    /// Display name shown in UI
    pub display_name: String,
    /// Icon identifier
    pub icon: Option<String>,
    /// Color gradient hint
    pub color: Option<String>,
    /// Audio file name, resolved against the configured audio directory
    pub source: String,
    /// Short description
    pub description: Option<String>,
}

impl ChannelConfig {
    /// Create a catalog channel with no presentation hints.
    #[must_use]
    pub fn new(id: &str, display_name: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            icon: None,
            color: None,
            source: source.to_string(),
            description: None,
        }
    }

    fn with_hints(mut self, icon: &str, color: &str, description: &str) -> Self {
        self.icon = Some(icon.to_string());
        self.color = Some(color.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Locator handed to the audio output when loading this channel.
    #[must_use]
    pub fn source_locator(&self, audio_dir: &str) -> String {
        if audio_dir.is_empty() {
            return self.source.clone();
        }
        format!("{}/{}", audio_dir.trim_end_matches('/'), self.source)
    }
}

/// Default ambient channels.
pub fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::new("rain", "Rain", "rain.mp3").with_hints(
            "fa-cloud-rain",
            "from-blue-500 to-cyan-500",
            "Gentle rainfall",
        ),
        ChannelConfig::new("ocean", "Ocean Waves", "ocean.mp3").with_hints(
            "fa-water",
            "from-teal-500 to-blue-500",
            "Calming ocean waves",
        ),
        ChannelConfig::new("forest", "Forest", "birds.mp3").with_hints(
            "fa-tree",
            "from-green-500 to-emerald-500",
            "Birds and wind in trees",
        ),
        ChannelConfig::new("fireplace", "Fireplace", "fireplace.mp3").with_hints(
            "fa-fire",
            "from-orange-500 to-red-500",
            "Crackling fire",
        ),
        ChannelConfig::new("thunder", "Thunder", "thunder.mp3").with_hints(
            "fa-bolt",
            "from-purple-500 to-indigo-500",
            "Distant thunder",
        ),
        ChannelConfig::new("wind", "Wind", "wind.mp3").with_hints(
            "fa-wind",
            "from-gray-400 to-gray-600",
            "Gentle breeze",
        ),
        ChannelConfig::new("cafe", "Coffee Shop", "cafe.mp3").with_hints(
            "fa-mug-hot",
            "from-amber-600 to-yellow-600",
            "Ambient cafe sounds",
        ),
        ChannelConfig::new("night", "Night", "night.mp3").with_hints(
            "fa-moon",
            "from-indigo-600 to-purple-600",
            "Crickets and night sounds",
        ),
    ]
}

/// Runtime state for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Catalog channel id
    pub id: String,
    /// Individual volume (0 - 100)
    pub volume: u8,
    /// Whether the channel was deliberately turned on
    pub playing: bool,
}

impl ChannelState {
    /// Create a silent, stopped channel.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), volume: 0, playing: false }
    }
}
