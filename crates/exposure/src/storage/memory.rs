//! In-memory storage implementation
//!
//! Used by tests and the simulator; nothing survives the process.

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;

use super::KeyValueStore;

/// In-memory implementation of KeyValueStore
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().map_err(|_| anyhow!("marker store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("marker store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("marker store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut values = self.values.write().map_err(|_| anyhow!("marker store lock poisoned"))?;
        values.clear();
        Ok(())
    }
}
