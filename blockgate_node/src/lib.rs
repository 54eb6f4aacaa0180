//! Node assembly and HTTP API server for blockgate.
//!
//! A node is an opened repository plus a mount-ordered store whose block
//! prefix resolves against a remote source. This crate wires the two
//! together and serves the result over two listeners: the read-write API
//! and the read-only gateway.

use std::path::PathBuf;

pub mod config;
pub mod node;
pub mod repo;
pub mod routes;
pub mod server;

pub use config::{Addresses, ConfigError, NodeConfig};
pub use node::{BLOCKS_PREFIX, BlockStat, Node};
pub use repo::{Repo, RepoError};
pub use server::{ApiServer, RunningServer, ServerError, ShutdownError};

/// Opens the repo, assembles the node, and serves until interrupted.
pub async fn run_daemon(repo_root: impl Into<PathBuf>) -> anyhow::Result<()> {
    let repo = Repo::open(repo_root)?;
    let node = Node::create(repo);
    let server = ApiServer::new(node).start().await?;
    println!("Daemon is ready");

    tokio::signal::ctrl_c().await?;
    println!("Received interrupt signal, shutting down..");
    server.stop().await?;
    Ok(())
}
