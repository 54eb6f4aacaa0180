use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::key::Key;
use crate::store::{Store, StoreError, StoreResult};

/// A (prefix, store) binding.
#[derive(Clone)]
pub struct Mount {
    prefix: Key,
    store: Arc<dyn Store>,
}

impl Mount {
    pub fn new(prefix: Key, store: Arc<dyn Store>) -> Self {
        Self { prefix, store }
    }

    pub fn prefix(&self) -> &Key {
        &self.prefix
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("prefix", &self.prefix)
            .field("store", &self.store)
            .finish()
    }
}

/// An ordered list of mounts, consulted front to back.
///
/// Resolution is first-match-by-position, not by prefix specificity: for
/// overlapping prefixes, whichever mount sits earlier in the list wins. This
/// is what lets a read-only remote mount shadow a default mount for the same
/// prefix while leaving every other prefix untouched.
///
/// The list is assembled before the serving entity is constructed and is
/// immutable afterwards: both [`MountStore::push`] and [`MountStore::prepend`]
/// take `&mut self`, so once the store is shared behind an `Arc` no further
/// mutation is possible.
#[derive(Debug, Default)]
pub struct MountStore {
    mounts: Vec<Mount>,
}

impl MountStore {
    pub fn new() -> Self {
        Self { mounts: Vec::new() }
    }

    /// Appends a mount at the end of the resolution order.
    pub fn push(&mut self, prefix: Key, store: Arc<dyn Store>) {
        self.mounts.push(Mount::new(prefix, store));
    }

    /// Inserts a mount ahead of all existing ones, making it the effective
    /// source of truth for its prefix.
    pub fn prepend(&mut self, prefix: Key, store: Arc<dyn Store>) {
        self.mounts.insert(0, Mount::new(prefix, store));
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    /// Returns the first mount whose prefix matches `key`, in list order.
    ///
    /// A key no mount covers is a configuration error and fails fast with
    /// [`StoreError::NoMount`] rather than falling back to an implicit store.
    pub fn resolve(&self, key: &Key) -> StoreResult<&Mount> {
        self.mounts
            .iter()
            .find(|mount| key.has_prefix(&mount.prefix))
            .ok_or_else(|| StoreError::NoMount(key.clone()))
    }
}

#[async_trait]
impl Store for MountStore {
    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        self.resolve(key)?.store.get(key).await
    }

    async fn put(&self, key: &Key, value: Bytes) -> StoreResult<()> {
        self.resolve(key)?.store.put(key, value).await
    }

    async fn delete(&self, key: &Key) -> StoreResult<()> {
        self.resolve(key)?.store.delete(key).await
    }

    async fn contains(&self, key: &Key) -> StoreResult<bool> {
        self.resolve(key)?.store.contains(key).await
    }
}
