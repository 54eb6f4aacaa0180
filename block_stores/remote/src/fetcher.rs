use bytes::Bytes;
use cid::Cid;
use reqwest::StatusCode;

use crate::{FetchError, RemoteSourceConfig};

/// Fetches raw block bytes from the remote source, one GET per call.
///
/// The client carries no timeout and the fetcher never retries: a miss costs
/// exactly one request, and deadlines belong to the surrounding transport.
#[derive(Debug, Clone)]
pub struct BlockFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl BlockFetcher {
    pub fn new(config: &RemoteSourceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url(),
        }
    }

    /// The request URI for a block: the CID's canonical string encoding
    /// appended to the fixed base.
    pub fn block_url(&self, cid: &Cid) -> String {
        format!("{}/api/v0/block/get?arg={}", self.base_url, cid)
    }

    /// Issues one GET for the block and buffers the full response body.
    ///
    /// HTTP 404 means the source reports the block as absent; any other
    /// non-success status or transport failure is an error in its own
    /// right, surfaced without retry.
    pub async fn fetch(&self, cid: &Cid) -> Result<Bytes, FetchError> {
        let url = self.block_url(cid);
        tracing::debug!(%cid, %url, "fetching block from remote source");

        let response = self.client.get(&url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(FetchError::NotFound(cid.to_owned())),
            status if !status.is_success() => Err(FetchError::Status {
                cid: cid.to_owned(),
                status: status.as_u16(),
            }),
            _ => Ok(response.bytes().await?),
        }
    }
}
