//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{KeyValueStore, StoreResult};

#[derive(Default)]
struct Inner {
    values: HashMap<String, String>,
    writes: usize,
}

/// Process-local store.
///
/// Clones share the same contents, so a caller can keep a handle for
/// inspection after giving one to a [`crate::PresetStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.inner.lock().values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_contents() {
        let store = MemoryStore::new();
        let mut writer = store.clone();

        writer.set("presets", "{}").unwrap();

        assert_eq!(store.get("presets").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.writes(), 1);
    }
}
