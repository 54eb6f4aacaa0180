use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::key::Key;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key does not exist in this store, or the remote source
    /// explicitly reported the addressed block as absent.
    #[error("key not found: {0}")]
    NotFound(Key),

    /// The store does not support the attempted write operation.
    #[error("store is read-only: {op} is not supported")]
    ReadOnly { op: &'static str },

    /// The key is malformed for this store, e.g. its remainder does not
    /// decode to a content identifier.
    #[error("invalid key {key}: {reason}")]
    InvalidKey { key: Key, reason: String },

    /// No mount covers the key. Mount tables are fixed at startup, so this
    /// is a configuration error, not a runtime condition to retry.
    #[error("no mount matches key {0}")]
    NoMount(Key),

    /// A remote fetch failed in transit: connection failure, timeout, or a
    /// non-success status that is not the absence signal.
    #[error("remote fetch failed: {0}")]
    Fetch(anyhow::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// The key/value store capability mounts bind to.
///
/// Implementations that only support the read side must fail `put` and
/// `delete` with [`StoreError::ReadOnly`], never silently succeed.
#[async_trait]
pub trait Store: std::fmt::Debug + Send + Sync + 'static {
    async fn get(&self, key: &Key) -> StoreResult<Bytes>;

    async fn put(&self, key: &Key, value: Bytes) -> StoreResult<()>;

    async fn delete(&self, key: &Key) -> StoreResult<()>;

    async fn contains(&self, key: &Key) -> StoreResult<bool>;
}
