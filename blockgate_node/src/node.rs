use std::io;
use std::sync::Arc;

use blockgate_core::{Cid, Key, MountStore, Store, StoreResult};
use blockgate_store_memory::MemoryStore;
use blockgate_store_remote::RemoteBlockStore;
use bytes::Bytes;
use serde::Serialize;

use crate::repo::Repo;

/// The key prefix the remote mount owns.
pub const BLOCKS_PREFIX: &str = "/blocks";

/// Size-only stat for a block, shaped like the HTTP API's response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BlockStat {
    pub key: String,
    pub size: u64,
}

/// A node: the opened repo plus the mount-ordered store over it.
#[derive(Debug)]
pub struct Node {
    repo: Repo,
    store: MountStore,
}

impl Node {
    /// Assembles the mount table and wraps it.
    ///
    /// Default mounts go in first, then the remote mount is prepended for
    /// the block prefix. First-match-by-position makes the remote store the
    /// source of truth for `/blocks` while every other prefix keeps
    /// resolving to the default stores. The table is complete before the
    /// node exists, so no request can ever observe it without the remote
    /// mount.
    pub fn create(repo: Repo) -> Self {
        let mut store = MountStore::new();
        store.push(Key::new(BLOCKS_PREFIX), Arc::new(MemoryStore::new()));
        store.push(Key::root(), Arc::new(MemoryStore::new()));

        let remote = &repo.config().remote;
        tracing::info!("mounting remote block source: {}", remote.base_url());
        store.prepend(
            Key::new(BLOCKS_PREFIX),
            Arc::new(RemoteBlockStore::new(remote, Key::new(BLOCKS_PREFIX))),
        );

        Self { repo, store }
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    pub fn store(&self) -> &MountStore {
        &self.store
    }

    fn block_key(cid: &Cid) -> Key {
        Key::new(BLOCKS_PREFIX).child(&cid.to_string())
    }

    pub async fn block_get(&self, cid: &Cid) -> StoreResult<Bytes> {
        self.store.get(&Self::block_key(cid)).await
    }

    pub async fn block_stat(&self, cid: &Cid) -> StoreResult<BlockStat> {
        let bytes = self.block_get(cid).await?;
        Ok(BlockStat {
            key: cid.to_string(),
            size: bytes.len() as u64,
        })
    }

    pub async fn block_delete(&self, cid: &Cid) -> StoreResult<()> {
        self.store.delete(&Self::block_key(cid)).await
    }

    /// Tears down node-held state; the published API address goes with it.
    pub fn stop(&self) -> io::Result<()> {
        tracing::info!("node stopped");
        self.repo.clear_api_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockgate_core::StoreError;
    use crate::config::NodeConfig;
    use crate::repo::CONFIG_FILE;

    const SOME_CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn test_node(dir: &std::path::Path) -> Node {
        let mut config = NodeConfig::default();
        // A port nobody serves; tests here never complete a fetch.
        config.remote.host = "127.0.0.1".to_owned();
        config.remote.port = 1;
        std::fs::write(
            dir.join(CONFIG_FILE),
            toml::to_string(&config).unwrap(),
        )
        .unwrap();
        Node::create(Repo::open(dir).unwrap())
    }

    #[tokio::test]
    async fn block_writes_hit_the_read_only_remote_mount() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path());
        let cid: Cid = SOME_CID.parse().unwrap();

        let err = node
            .store()
            .put(&Node::block_key(&cid), Bytes::from_static(b"data"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ReadOnly { op: "put" }), "got {err:?}");

        let err = node.block_delete(&cid).await.unwrap_err();
        assert!(
            matches!(err, StoreError::ReadOnly { op: "delete" }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn non_block_prefixes_resolve_to_the_default_store() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path());
        let key = Key::new("/datastore/pins");

        node.store()
            .put(&key, Bytes::from_static(b"pinned"))
            .await
            .unwrap();
        assert_eq!(
            node.store().get(&key).await.unwrap(),
            Bytes::from_static(b"pinned")
        );
    }

    #[tokio::test]
    async fn block_get_reaches_the_remote_mount_not_the_default() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path());
        let cid: Cid = SOME_CID.parse().unwrap();

        // The unreachable remote source answers with a fetch error. If the
        // default (empty) block mount were consulted first this would be
        // NotFound instead.
        let err = node.block_get(&cid).await.unwrap_err();
        assert!(matches!(err, StoreError::Fetch(_)), "got {err:?}");
    }

    #[test]
    fn stop_clears_the_published_api_address() {
        let dir = tempfile::tempdir().unwrap();
        let node = test_node(dir.path());

        node.repo().set_api_address("/ip4/127.0.0.1/tcp/5002").unwrap();
        node.stop().unwrap();
        assert_eq!(node.repo().api_address().unwrap(), None);
    }
}
