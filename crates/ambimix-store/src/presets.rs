//! Custom preset storage.
//!
//! All custom presets are persisted together as one JSON object under
//! [`PRESETS_KEY`], rewritten in full on every change:
//!
//! ```json
//! { "custom-1718000000000": { "name": "Evening", "sounds": { "rain": 50 } } }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use ambimix_core::{Error, Preset, VolumeSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{KeyValueStore, StoreResult};

/// Key the preset document is stored under.
pub const PRESETS_KEY: &str = "presets";

/// Persisted form of a single preset.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreset {
    name: String,
    sounds: BTreeMap<String, u64>,
}

/// Durable CRUD over custom presets.
///
/// Name uniqueness and non-empty mixes are the caller's concern; this type
/// only stores what it is given.
pub struct PresetStore {
    store: Box<dyn KeyValueStore + Send>,
    /// Presets in insertion order
    presets: Vec<Preset>,
    /// Millisecond stamp of the last generated id
    last_stamp: u128,
}

impl fmt::Debug for PresetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetStore")
            .field("presets", &self.presets)
            .field("last_stamp", &self.last_stamp)
            .finish_non_exhaustive()
    }
}

impl PresetStore {
    /// Load presets from `store`. A missing document yields an empty set.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read or the document is not valid JSON.
    pub fn open(store: Box<dyn KeyValueStore + Send>) -> StoreResult<Self> {
        let presets = match store.get(PRESETS_KEY)? {
            Some(json) => decode(&json)?,
            None => {
                debug!("No stored presets, starting empty");
                Vec::new()
            }
        };

        info!(count = presets.len(), "Loaded custom presets");
        Ok(Self { store, presets, last_stamp: 0 })
    }

    /// Save a new preset from a volume snapshot and return its id.
    ///
    /// Only channels with a volume above zero are kept.
    ///
    /// # Errors
    /// Returns an error if the preset document cannot be written; the preset is not kept.
    pub fn save_preset(&mut self, name: &str, snapshot: &VolumeSnapshot) -> StoreResult<String> {
        let id = self.next_id();
        self.presets.push(Preset::capture(id.clone(), name.to_string(), snapshot));

        if let Err(e) = self.persist() {
            self.presets.pop();
            return Err(e);
        }

        info!(id = %id, name = %name, "Preset saved");
        Ok(id)
    }

    /// Get a preset by id.
    ///
    /// # Errors
    /// Returns `PresetNotFound` if no preset has this id.
    pub fn load_preset(&self, id: &str) -> ambimix_core::Result<&Preset> {
        self.presets.iter().find(|p| p.id == id).ok_or_else(|| Error::PresetNotFound(id.to_string()))
    }

    /// Delete a preset. Returns `false` without writing if the id is unknown.
    ///
    /// # Errors
    /// Returns an error if the preset document cannot be written; the preset is kept.
    pub fn delete_preset(&mut self, id: &str) -> StoreResult<bool> {
        let Some(index) = self.presets.iter().position(|p| p.id == id) else {
            return Ok(false);
        };

        let removed = self.presets.remove(index);
        if let Err(e) = self.persist() {
            self.presets.insert(index, removed);
            return Err(e);
        }

        info!(id = %id, "Preset deleted");
        Ok(true)
    }

    /// Whether a preset with exactly this name exists.
    #[must_use]
    pub fn name_exists(&self, name: &str) -> bool {
        self.presets.iter().any(|p| p.name == name)
    }

    /// Iterate presets in insertion order.
    pub fn list_all(&self) -> impl Iterator<Item = (&str, &Preset)> + '_ {
        self.presets.iter().map(|p| (p.id.as_str(), p))
    }

    /// Number of stored presets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Whether no presets are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Generate an id that never repeats within this store.
    fn next_id(&mut self) -> String {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_millis());
        let mut stamp = now.max(self.last_stamp + 1);

        while self.presets.iter().any(|p| p.id == format!("custom-{stamp}")) {
            stamp += 1;
        }

        self.last_stamp = stamp;
        format!("custom-{stamp}")
    }

    fn persist(&mut self) -> StoreResult<()> {
        let json = encode(&self.presets)?;
        self.store.set(PRESETS_KEY, &json)?;
        debug!(count = self.presets.len(), "Presets persisted");
        Ok(())
    }
}

fn encode(presets: &[Preset]) -> StoreResult<String> {
    let mut document = Map::new();
    for preset in presets {
        let stored = StoredPreset {
            name: preset.name.clone(),
            sounds: preset.volumes.iter().map(|(k, v)| (k.clone(), u64::from(*v))).collect(),
        };
        document.insert(preset.id.clone(), serde_json::to_value(stored)?);
    }
    Ok(serde_json::to_string(&Value::Object(document))?)
}

fn decode(json: &str) -> StoreResult<Vec<Preset>> {
    let document: Map<String, Value> = serde_json::from_str(json)?;
    let mut presets = Vec::with_capacity(document.len());

    for (id, value) in document {
        let stored: StoredPreset = match serde_json::from_value(value) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(id = %id, error = %e, "Skipping malformed preset");
                continue;
            }
        };

        let mut volumes = VolumeSnapshot::new();
        for (channel, volume) in stored.sounds {
            match u8::try_from(volume) {
                Ok(volume @ 1..=100) => {
                    volumes.insert(channel, volume);
                }
                _ => warn!(id = %id, channel = %channel, volume, "Skipping out-of-range volume"),
            }
        }

        presets.push(Preset { id, name: stored.name, volumes });
    }

    Ok(presets)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::{MemoryStore, MockKeyValueStore, StoreError};

    fn snapshot(pairs: &[(&str, u8)]) -> VolumeSnapshot {
        pairs.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    fn open(store: &MemoryStore) -> PresetStore {
        PresetStore::open(Box::new(store.clone())).expect("Failed to open preset store")
    }

    #[test]
    fn test_missing_document_starts_empty() {
        let store = MemoryStore::new();
        let presets = open(&store);

        assert!(presets.is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_save_keeps_only_audible_channels() {
        let store = MemoryStore::new();
        let mut presets = open(&store);

        let id = presets.save_preset("Evening", &snapshot(&[("rain", 50), ("cafe", 0)])).unwrap();

        let preset = presets.load_preset(&id).unwrap();
        assert_eq!(preset.name, "Evening");
        assert_eq!(preset.volumes, snapshot(&[("rain", 50)]));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn test_persisted_layout() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        let id = presets.save_preset("Evening", &snapshot(&[("rain", 50)])).unwrap();

        let json = store.get(PRESETS_KEY).unwrap().expect("document written");
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[&id]["name"], "Evening");
        assert_eq!(value[&id]["sounds"]["rain"], 50);
    }

    #[test]
    fn test_ids_are_unique_and_prefixed() {
        let store = MemoryStore::new();
        let mut presets = open(&store);

        let ids: Vec<_> = (0..5)
            .map(|i| presets.save_preset(&format!("Mix {i}"), &snapshot(&[("rain", 10)])).unwrap())
            .collect();

        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 5);
        assert!(ids.iter().all(|id| id.starts_with("custom-")));
    }

    #[test]
    fn test_reopen_preserves_insertion_order() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        presets.save_preset("Zebra", &snapshot(&[("rain", 10)])).unwrap();
        presets.save_preset("Apple", &snapshot(&[("ocean", 20)])).unwrap();

        let reopened = open(&store);
        let names: Vec<_> = reopened.list_all().map(|(_, p)| p.name.as_str()).collect();

        assert_eq!(names, ["Zebra", "Apple"]);
    }

    #[test]
    fn test_list_all_reflects_current_state() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        let first = presets.save_preset("One", &snapshot(&[("rain", 10)])).unwrap();
        presets.save_preset("Two", &snapshot(&[("rain", 20)])).unwrap();
        assert_eq!(presets.list_all().count(), 2);

        presets.delete_preset(&first).unwrap();

        let ids: Vec<_> = presets.list_all().map(|(id, _)| id.to_string()).collect();
        assert_eq!(ids.len(), 1);
        assert_ne!(ids[0], first);
    }

    #[test]
    fn test_load_unknown_preset() {
        let store = MemoryStore::new();
        let presets = open(&store);

        assert_matches!(presets.load_preset("custom-0"), Err(Error::PresetNotFound(id)) if id == "custom-0");
    }

    #[test]
    fn test_delete_existing_persists() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        let id = presets.save_preset("Evening", &snapshot(&[("rain", 50)])).unwrap();

        assert!(presets.delete_preset(&id).unwrap());
        assert_eq!(store.writes(), 2);
        assert!(open(&store).is_empty());
    }

    #[test]
    fn test_delete_unknown_does_not_write() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_set().times(0);

        let mut presets = PresetStore::open(Box::new(mock)).unwrap();

        assert!(!presets.delete_preset("custom-404").unwrap());
    }

    #[test]
    fn test_failed_write_keeps_memory_consistent() {
        let mut mock = MockKeyValueStore::new();
        mock.expect_get().returning(|_| Ok(None));
        mock.expect_set().returning(|_, _| Err(StoreError::NoDataDir));

        let mut presets = PresetStore::open(Box::new(mock)).unwrap();

        assert!(presets.save_preset("Evening", &snapshot(&[("rain", 50)])).is_err());
        assert!(presets.is_empty());
        assert!(!presets.name_exists("Evening"));
    }

    #[test]
    fn test_name_exists_is_exact() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        presets.save_preset("Evening", &snapshot(&[("rain", 50)])).unwrap();

        assert!(presets.name_exists("Evening"));
        assert!(!presets.name_exists("evening"));
        assert!(!presets.name_exists("Evening "));
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, "not json").unwrap();

        assert_matches!(PresetStore::open(Box::new(store)), Err(StoreError::Serialization(_)));
    }

    #[test]
    fn test_debug_lists_presets() {
        let store = MemoryStore::new();
        let mut presets = open(&store);
        presets.save_preset("Evening", &snapshot(&[("rain", 50)])).unwrap();

        let rendered = format!("{presets:?}");
        assert!(rendered.starts_with("PresetStore"));
        assert!(rendered.contains("Evening"));
    }

    #[test]
    fn test_decode_skips_bad_entries() {
        let mut store = MemoryStore::new();
        store
            .set(
                PRESETS_KEY,
                r#"{
                    "custom-1": { "name": "Good", "sounds": { "rain": 40, "wind": 0, "cafe": 300 } },
                    "custom-2": { "sounds": {} }
                }"#,
            )
            .unwrap();

        let presets = open(&store);

        assert_eq!(presets.len(), 1);
        assert_eq!(presets.load_preset("custom-1").unwrap().volumes, snapshot(&[("rain", 40)]));
    }

    #[test]
    fn test_generated_id_skips_existing() {
        let mut store = MemoryStore::new();
        store.set(PRESETS_KEY, r#"{"custom-99999999999999": {"name": "Future", "sounds": {"rain": 1}}}"#).unwrap();
        let mut presets = open(&store);
        presets.last_stamp = 99_999_999_999_998;

        let id = presets.save_preset("Next", &snapshot(&[("rain", 5)])).unwrap();

        assert_eq!(id, "custom-100000000000000");
    }
}
