use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use larder_core::{StoreError, StoreResult};

use super::r#trait::ByteStore;

/// In-memory byte store.
///
/// Intended for tests/dev. Contents are lost with the process.
#[derive(Debug, Default)]
pub struct InMemoryByteStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryByteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with one raw value (e.g. a hand-written payload).
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ByteStore for InMemoryByteStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> StoreResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::unavailable("lock poisoned"))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
