use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::storage::area::KeyValueStore;

/// In‑memory key-value store (no persistence). Used as a default when the host provides no storage.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    map: Mutex<HashMap<String, Value>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_sync(&self, key: &str) -> Result<Option<Value>> {
        let map = self.map.lock().map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, blob: Value) -> Result<()> {
        self.map
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?
            .insert(key.to_string(), blob);
        Ok(())
    }
}
