use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{ConfigError, parse_listen_addr, to_multiaddr};
use crate::node::Node;
use crate::repo::RepoError;
use crate::routes;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {listener} listener on {addr}: {source}")]
    Bind {
        listener: &'static str,
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to record api address: {0}")]
    Announce(#[source] io::Error),

    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Aggregate of best-effort shutdown failures. Each entry was already
/// logged when it happened; this reports them once to the caller that
/// requested the stop.
#[derive(Debug, Error)]
#[error("shutdown finished with errors: {}", errors.join("; "))]
pub struct ShutdownError {
    errors: Vec<String>,
}

impl ShutdownError {
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// The HTTP API server over a [`Node`].
///
/// `start` runs two ordered steps: configure-and-bind, then
/// resolve-addresses-and-announce. A failure in the first step leaves
/// nothing bound and nothing spawned, so a partial startup cannot leak
/// listeners.
pub struct ApiServer {
    node: Arc<Node>,
}

impl ApiServer {
    pub fn new(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    pub async fn start(self) -> Result<RunningServer, ServerError> {
        // Step 1: read config, build both route tables, bind both listeners.
        tracing::info!("fetching config");
        let addresses = &self.node.repo().config().addresses;
        let api_addr = parse_listen_addr(&addresses.api)?;
        let gateway_addr = parse_listen_addr(&addresses.gateway)?;

        let api_router = routes::api_router(self.node.clone());
        let gateway_router = routes::gateway_router(self.node.clone());

        let api_listener = bind("API", api_addr).await?;
        let gateway_listener = bind("Gateway", gateway_addr).await?;

        // Step 2: resolve the bound addresses (an ephemeral port becomes
        // concrete here), start serving, and announce the API address.
        let api_addr = local_addr("API", api_addr, &api_listener)?;
        let gateway_addr = local_addr("Gateway", gateway_addr, &gateway_listener)?;

        let running = RunningServer {
            node: self.node,
            api_addr,
            gateway_addr,
            listeners: vec![
                ListenerHandle::spawn("API", api_listener, api_router),
                ListenerHandle::spawn("Gateway", gateway_listener, gateway_router),
            ],
        };

        let api_multiaddr = to_multiaddr(api_addr);
        if let Err(err) = running.node.repo().set_api_address(&api_multiaddr) {
            // Startup fails as a unit: tear down what step 2 started.
            let _ = running.stop().await;
            return Err(ServerError::Announce(err));
        }

        tracing::info!("API is listening on: {api_multiaddr}");
        tracing::info!(
            "Gateway (read-only) is listening on: {}",
            to_multiaddr(gateway_addr)
        );
        Ok(running)
    }
}

async fn bind(listener: &'static str, addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            listener,
            addr,
            source,
        })
}

fn local_addr(
    listener: &'static str,
    requested: SocketAddr,
    socket: &TcpListener,
) -> Result<SocketAddr, ServerError> {
    socket.local_addr().map_err(|source| ServerError::Bind {
        listener,
        addr: requested,
        source,
    })
}

struct ListenerHandle {
    name: &'static str,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl ListenerHandle {
    fn spawn(name: &'static str, listener: TcpListener, router: axum::Router) -> Self {
        let (shutdown, rx) = oneshot::channel::<()>();
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            let _ = rx.await;
        });
        let task = tokio::spawn(async move { serve.await });
        Self {
            name,
            shutdown,
            task,
        }
    }

    async fn stop(self, errors: &mut Vec<String>) {
        // The send only fails if the serving task is already gone; the join
        // below reports why.
        let _ = self.shutdown.send(());
        match self.task.await {
            Ok(Ok(())) => tracing::debug!("{} listener stopped", self.name),
            Ok(Err(err)) => {
                tracing::error!("error stopping {} listener: {err}", self.name);
                errors.push(format!("{} listener: {err}", self.name));
            }
            Err(err) => {
                tracing::error!("{} listener task failed: {err}", self.name);
                errors.push(format!("{} listener: {err}", self.name));
            }
        }
    }
}

/// A started server: resolved listener addresses plus the handles needed to
/// stop it.
pub struct RunningServer {
    node: Arc<Node>,
    api_addr: SocketAddr,
    gateway_addr: SocketAddr,
    listeners: Vec<ListenerHandle>,
}

impl RunningServer {
    pub fn api_addr(&self) -> SocketAddr {
        self.api_addr
    }

    pub fn gateway_addr(&self) -> SocketAddr {
        self.gateway_addr
    }

    /// Sequential best-effort shutdown: stop both listeners, then the node.
    /// Every step runs even if an earlier one fails; failures are logged as
    /// they happen and reported once, in aggregate.
    pub async fn stop(self) -> Result<(), ShutdownError> {
        tracing::info!("stopping");
        let mut errors = Vec::new();
        for listener in self.listeners {
            listener.stop(&mut errors).await;
        }
        if let Err(err) = self.node.stop() {
            tracing::error!("error stopping node: {err}");
            errors.push(format!("node: {err}"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            tracing::warn!("there were errors stopping");
            Err(ShutdownError { errors })
        }
    }
}
