//! Remote block storage backend.
//!
//! Resolves block reads against a remote source over HTTP: a key under the
//! block prefix is decoded to a CID and fetched with a single GET against
//! the source's `/api/v0/block/get` endpoint. The backend is strictly
//! read-only; writes fail loudly instead of pretending to succeed.

mod config;
mod fetcher;
mod store;

pub use config::RemoteSourceConfig;
pub use fetcher::BlockFetcher;
pub use store::RemoteBlockStore;

use cid::Cid;
use thiserror::Error;

/// Errors from a single block fetch against the remote source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source answered HTTP 404: the block does not exist there.
    /// This is the documented absence signal, distinct from transport
    /// failure.
    #[error("block {0} not found on remote source")]
    NotFound(Cid),

    /// The source answered with a non-success status other than 404.
    #[error("remote source returned HTTP {status} for block {cid}")]
    Status { cid: Cid, status: u16 },

    /// The request never completed: connection failure, protocol error,
    /// or an interrupted body.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
}
