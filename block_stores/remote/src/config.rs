use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const ENV_PROTOCOL: &str = "BLOCKGATE_REMOTE_PROTOCOL";
pub const ENV_HOST: &str = "BLOCKGATE_REMOTE_HOST";
pub const ENV_PORT: &str = "BLOCKGATE_REMOTE_PORT";

/// Where block fetches go. Fixed at process configuration, not per-request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(default)]
pub struct RemoteSourceConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
}

impl Default for RemoteSourceConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_owned(),
            host: "localhost".to_owned(),
            port: 5001,
        }
    }
}

impl RemoteSourceConfig {
    /// Applies `BLOCKGATE_REMOTE_{PROTOCOL,HOST,PORT}` environment overrides
    /// on top of this config. Set variables win over file values.
    pub fn overlay_env(mut self) -> anyhow::Result<Self> {
        if let Ok(protocol) = std::env::var(ENV_PROTOCOL) {
            self.protocol = protocol;
        }
        if let Ok(host) = std::env::var(ENV_HOST) {
            self.host = host;
        }
        if let Ok(port) = std::env::var(ENV_PORT) {
            self.port = port
                .parse()
                .with_context(|| format!("invalid {ENV_PORT} value '{port}'"))?;
        }
        Ok(self)
    }

    /// Defaults (`http://localhost:5001`) plus environment overrides.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().overlay_env()
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}
