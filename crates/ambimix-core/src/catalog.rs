//! Static channel catalog and builtin presets.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelConfig, default_channels};
use crate::preset::{BuiltinPreset, default_presets};

/// Read-only list of channels and the presets shipped with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    channels: Vec<ChannelConfig>,
    presets: Vec<BuiltinPreset>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_channels(), default_presets())
    }
}

impl Catalog {
    /// Create a catalog from explicit channel and preset lists.
    #[must_use]
    pub fn new(channels: Vec<ChannelConfig>, presets: Vec<BuiltinPreset>) -> Self {
        Self { channels, presets }
    }

    /// All channels, in display order.
    #[must_use]
    pub fn channels(&self) -> &[ChannelConfig] {
        &self.channels
    }

    /// All builtin presets.
    #[must_use]
    pub fn presets(&self) -> &[BuiltinPreset] {
        &self.presets
    }

    /// Look up a builtin preset by id.
    #[must_use]
    pub fn preset(&self, id: &str) -> Option<&BuiltinPreset> {
        self.presets.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel<'a>(catalog: &'a Catalog, id: &str) -> Option<&'a ChannelConfig> {
        catalog.channels().iter().find(|c| c.id == id)
    }

    #[test]
    fn test_default_catalog_lookup() {
        let catalog = Catalog::default();

        assert_eq!(channel(&catalog, "cafe").map(|c| c.display_name.as_str()), Some("Coffee Shop"));
        assert!(channel(&catalog, "traffic").is_none());
        assert!(catalog.preset("focus").is_some());
        assert!(catalog.preset("Focus").is_none());
    }

    #[test]
    fn test_builtin_presets_reference_catalog_channels() {
        let catalog = Catalog::default();

        for preset in catalog.presets() {
            for channel_id in preset.volumes.keys() {
                assert!(channel(&catalog, channel_id).is_some(), "{channel_id} missing from catalog");
            }
        }
    }
}
