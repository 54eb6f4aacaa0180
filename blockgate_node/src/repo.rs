use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::NodeConfig;

pub const CONFIG_FILE: &str = "config.toml";
pub const API_FILE: &str = "api";

#[derive(Debug, Error)]
pub enum RepoError {
    /// No repo exists at the expected location. Callers should relay the
    /// remediation hint instead of a generic failure.
    #[error("no repo found at {path}; run 'blockgate init' first")]
    Missing { path: PathBuf },

    #[error("could not read repo config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An opened repository: the root directory plus its resolved config.
///
/// The config is the on-disk `config.toml` with remote-source environment
/// overrides layered on top, fixed for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
    config: NodeConfig,
}

impl Repo {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, RepoError> {
        let root = root.into();
        let config_path = root.join(CONFIG_FILE);
        if !config_path.is_file() {
            return Err(RepoError::Missing { path: root });
        }

        let raw = fs::read_to_string(&config_path)?;
        let mut config: NodeConfig = toml::from_str(&raw).map_err(|err| RepoError::Config {
            path: config_path.clone(),
            reason: err.to_string(),
        })?;
        config.remote = config
            .remote
            .overlay_env()
            .map_err(|err| RepoError::Config {
                path: config_path,
                reason: err.to_string(),
            })?;

        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn api_file(&self) -> PathBuf {
        self.root.join(API_FILE)
    }

    /// Records the bound API listener's multiaddr in `<repo>/api` so
    /// external tooling can locate the running daemon.
    pub fn set_api_address(&self, multiaddr: &str) -> io::Result<()> {
        let tmp_path = self.api_file().with_extension("tmp");
        fs::write(&tmp_path, multiaddr)?;
        fs::rename(&tmp_path, self.api_file())
    }

    pub fn api_address(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(self.api_file()) {
            Ok(addr) => Ok(Some(addr.trim().to_owned())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub fn clear_api_address(&self) -> io::Result<()> {
        match fs::remove_file(self.api_file()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
