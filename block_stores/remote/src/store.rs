use async_trait::async_trait;
use blockgate_core::{Key, Store, StoreError, StoreResult};
use bytes::Bytes;
use cid::Cid;

use crate::{BlockFetcher, FetchError, RemoteSourceConfig};

/// Read-only store adapter over [`BlockFetcher`].
///
/// Keys under the configured prefix decode to CIDs and resolve against the
/// remote source. `put` and `delete` fail with [`StoreError::ReadOnly`] so
/// callers can tell "unsupported" apart from "silently dropped".
#[derive(Debug, Clone)]
pub struct RemoteBlockStore {
    fetcher: BlockFetcher,
    prefix: Key,
}

impl RemoteBlockStore {
    pub fn new(config: &RemoteSourceConfig, prefix: Key) -> Self {
        Self {
            fetcher: BlockFetcher::new(config),
            prefix,
        }
    }

    pub fn prefix(&self) -> &Key {
        &self.prefix
    }

    fn cid_from_key(&self, key: &Key) -> StoreResult<Cid> {
        let rest = key
            .strip_prefix(&self.prefix)
            .ok_or_else(|| StoreError::InvalidKey {
                key: key.clone(),
                reason: format!("expected a key under {}", self.prefix),
            })?;
        rest.parse().map_err(|err: cid::Error| StoreError::InvalidKey {
            key: key.clone(),
            reason: format!("not a valid CID: {err}"),
        })
    }
}

#[async_trait]
impl Store for RemoteBlockStore {
    async fn get(&self, key: &Key) -> StoreResult<Bytes> {
        let cid = self.cid_from_key(key)?;
        match self.fetcher.fetch(&cid).await {
            Ok(bytes) => Ok(bytes),
            Err(FetchError::NotFound(_)) => Err(StoreError::NotFound(key.clone())),
            Err(err) => Err(StoreError::Fetch(err.into())),
        }
    }

    async fn put(&self, _key: &Key, _value: Bytes) -> StoreResult<()> {
        Err(StoreError::ReadOnly { op: "put" })
    }

    async fn delete(&self, _key: &Key) -> StoreResult<()> {
        Err(StoreError::ReadOnly { op: "delete" })
    }

    /// The source exposes no cheaper existence probe, so this costs the
    /// same single GET as `get`.
    async fn contains(&self, key: &Key) -> StoreResult<bool> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
