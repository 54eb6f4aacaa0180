use blockgate_core::{Key, Store, StoreError, StoreResult};
use bytes::Bytes;
use dashmap::DashMap;

/// In-memory store backend.
///
/// Backs the default mounts of a node and is the store of choice in tests.
/// Values are `Bytes`, so reads hand out cheap views of the stored payload.
#[derive(Debug)]
pub struct MemoryStore {
    entries: DashMap<Key, Bytes>,
}

impl MemoryStore {
    /// Creates a new, empty `MemoryStore`.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn put(&self, key: &Key, value: Bytes) -> StoreResult<()> {
        self.entries.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        self.entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn contains(&self, key: &Key) -> StoreResult<bool> {
        Ok(self.entries.contains_key(key))
    }
}
