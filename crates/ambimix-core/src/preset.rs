//! Preset types for saving and recalling channel volume mixes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Channel volumes keyed by channel id.
pub type VolumeSnapshot = BTreeMap<String, u8>;

/// A user-saved preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    /// Generated preset id
    pub id: String,
    /// Preset name (unique among custom presets)
    pub name: String,
    /// Channel volumes, only channels that were audible at capture time
    pub volumes: VolumeSnapshot,
}

impl Preset {
    /// Build a preset from a volume snapshot, dropping silent channels.
    #[must_use]
    pub fn capture(id: String, name: String, snapshot: &VolumeSnapshot) -> Self {
        let volumes = snapshot
            .iter()
            .filter(|(_, volume)| **volume > 0)
            .map(|(channel, volume)| (channel.clone(), *volume))
            .collect();

        Self { id, name, volumes }
    }
}

/// A read-only preset shipped with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinPreset {
    /// Preset key (e.g., "focus")
    pub id: String,
    /// Display name
    pub name: String,
    /// Icon identifier
    pub icon: Option<String>,
    /// Channel volumes
    pub volumes: VolumeSnapshot,
}

impl BuiltinPreset {
    fn new(id: &str, name: &str, icon: &str, volumes: &[(&str, u8)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            icon: Some(icon.to_string()),
            volumes: volumes.iter().map(|(channel, volume)| ((*channel).to_string(), *volume)).collect(),
        }
    }
}

/// Summary of a preset for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSummary {
    /// Preset id
    pub id: String,
    /// Preset name
    pub name: String,
    /// Whether the preset ships with the catalog
    pub builtin: bool,
}

impl From<&Preset> for PresetSummary {
    fn from(preset: &Preset) -> Self {
        Self { id: preset.id.clone(), name: preset.name.clone(), builtin: false }
    }
}

impl From<&BuiltinPreset> for PresetSummary {
    fn from(preset: &BuiltinPreset) -> Self {
        Self { id: preset.id.clone(), name: preset.name.clone(), builtin: true }
    }
}

/// Default builtin presets.
pub fn default_presets() -> Vec<BuiltinPreset> {
    vec![
        BuiltinPreset::new("focus", "Focus", "fa-brain", &[("rain", 30), ("cafe", 20), ("wind", 10)]),
        BuiltinPreset::new("relax", "Relax", "fa-spa", &[("ocean", 40), ("forest", 30), ("wind", 20)]),
        BuiltinPreset::new("sleep", "Sleep", "fa-bed", &[("rain", 40), ("night", 30), ("wind", 15)]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keeps_only_audible_channels() {
        let snapshot: VolumeSnapshot =
            [("rain".to_string(), 50), ("cafe".to_string(), 0), ("wind".to_string(), 100)]
                .into_iter()
                .collect();

        let preset = Preset::capture("custom-1".into(), "Evening".into(), &snapshot);

        assert_eq!(preset.volumes.len(), 2);
        assert_eq!(preset.volumes.get("rain"), Some(&50));
        assert_eq!(preset.volumes.get("wind"), Some(&100));
        assert!(!preset.volumes.contains_key("cafe"));
    }

    #[test]
    fn test_default_presets() {
        let presets = default_presets();
        let ids: Vec<_> = presets.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["focus", "relax", "sleep"]);

        let sleep = &presets[2];
        assert_eq!(sleep.volumes.get("night"), Some(&30));
        assert!(sleep.volumes.values().all(|v| (1..=100).contains(v)));
    }

    #[test]
    fn test_summary_marks_builtin() {
        let builtin = &default_presets()[0];
        assert!(PresetSummary::from(builtin).builtin);

        let custom = Preset::capture("custom-1".into(), "Mine".into(), &VolumeSnapshot::new());
        assert!(!PresetSummary::from(&custom).builtin);
    }
}
