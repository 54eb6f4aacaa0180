use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use clap::Args;
use toml_edit::{DocumentMut, Item, Table};
use tracing::info;

/// Creates the repo config file if it doesn't exist and fills in any
/// missing settings. Explicit flags overwrite existing values; everything
/// else already present is left alone.
#[derive(Args)]
pub struct CmdInit {
    /// Listen multiaddr for the read-write API listener
    #[arg(long, value_name = "MULTIADDR")]
    api: Option<String>,

    /// Listen multiaddr for the read-only gateway listener
    #[arg(long, value_name = "MULTIADDR")]
    gateway: Option<String>,

    /// Protocol of the remote block source
    #[arg(long, value_name = "PROTOCOL")]
    remote_protocol: Option<String>,

    /// Host of the remote block source
    #[arg(long, value_name = "HOST")]
    remote_host: Option<String>,

    /// Port of the remote block source
    #[arg(long, value_name = "PORT")]
    remote_port: Option<u16>,
}

impl CmdInit {
    pub fn run(self, repo_root: &Path) -> anyhow::Result<()> {
        let config_file = repo_root.join(blockgate_node::repo::CONFIG_FILE);
        let mut doc = if config_file.exists() {
            fs::read_to_string(&config_file)?
        } else {
            fs::create_dir_all(repo_root)?;
            "".to_owned()
        }
        .parse::<DocumentMut>()
        .context("could not parse repo config file")?;

        let defaults = blockgate_node::NodeConfig::default();

        let addresses = doc
            .entry("addresses")
            .or_insert(Item::Table(Table::new()))
            .as_table_mut()
            .context("'addresses' is not a table")?;
        set_string(addresses, "api", self.api, defaults.addresses.api);
        set_string(addresses, "gateway", self.gateway, defaults.addresses.gateway);

        let remote = doc
            .entry("remote")
            .or_insert(Item::Table(Table::new()))
            .as_table_mut()
            .context("'remote' is not a table")?;
        set_string(
            remote,
            "protocol",
            self.remote_protocol,
            defaults.remote.protocol,
        );
        set_string(remote, "host", self.remote_host, defaults.remote.host);
        set_int(
            remote,
            "port",
            self.remote_port.map(i64::from),
            i64::from(defaults.remote.port),
        );

        info!("writing to config file {config_file:?}");

        let tmp_path = config_file.with_extension("tmp");
        let mut tmp = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        tmp.write_all(doc.to_string().as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, config_file)?;
        Ok(())
    }
}

fn set_string(table: &mut Table, key: &str, flag: Option<String>, default: String) {
    match flag {
        Some(value) => {
            table.insert(key, value.into());
        }
        None => {
            table.entry(key).or_insert(default.into());
        }
    }
}

fn set_int(table: &mut Table, key: &str, flag: Option<i64>, default: i64) {
    match flag {
        Some(value) => {
            table.insert(key, value.into());
        }
        None => {
            table.entry(key).or_insert(default.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockgate_node::Repo;

    fn init(repo_root: &Path, cmd: CmdInit) {
        cmd.run(repo_root).unwrap();
    }

    fn default_cmd() -> CmdInit {
        CmdInit {
            api: None,
            gateway: None,
            remote_protocol: None,
            remote_host: None,
            remote_port: None,
        }
    }

    #[test]
    fn init_writes_an_openable_repo() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        init(&root, default_cmd());

        let repo = Repo::open(&root).unwrap();
        assert_eq!(repo.config(), &blockgate_node::NodeConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        init(
            &root,
            CmdInit {
                api: Some("/ip4/127.0.0.1/tcp/4004".to_owned()),
                remote_port: Some(8545),
                ..default_cmd()
            },
        );

        let repo = Repo::open(&root).unwrap();
        assert_eq!(repo.config().addresses.api, "/ip4/127.0.0.1/tcp/4004");
        assert_eq!(repo.config().addresses.gateway, "/ip4/127.0.0.1/tcp/8080");
        assert_eq!(repo.config().remote.port, 8545);
    }

    #[test]
    fn reinit_preserves_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("repo");
        init(
            &root,
            CmdInit {
                gateway: Some("/ip4/127.0.0.1/tcp/9090".to_owned()),
                ..default_cmd()
            },
        );
        // A second init without flags must not clobber the custom gateway.
        init(&root, default_cmd());

        let repo = Repo::open(&root).unwrap();
        assert_eq!(repo.config().addresses.gateway, "/ip4/127.0.0.1/tcp/9090");
    }
}
