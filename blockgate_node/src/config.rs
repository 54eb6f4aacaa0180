use std::net::{IpAddr, SocketAddr};

use blockgate_store_remote::RemoteSourceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid listen address '{addr}': {reason}")]
    InvalidAddress { addr: String, reason: String },
}

/// Repo-level node configuration, stored as `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    pub addresses: Addresses,
    pub remote: RemoteSourceConfig,
}

/// Listen addresses for the two logical listeners, in multiaddr form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Addresses {
    /// Read-write API surface.
    pub api: String,
    /// Read-only gateway surface.
    pub gateway: String,
}

impl Default for Addresses {
    fn default() -> Self {
        Self {
            api: "/ip4/127.0.0.1/tcp/5002".to_owned(),
            gateway: "/ip4/127.0.0.1/tcp/8080".to_owned(),
        }
    }
}

/// Parses a `/ip4/<host>/tcp/<port>` (or `/ip6/…`) multiaddr into a bindable
/// socket address. Only the TCP listener form is supported; anything else is
/// a configuration error.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidAddress {
        addr: addr.to_owned(),
        reason: reason.to_owned(),
    };

    let parts: Vec<&str> = addr.split('/').collect();
    let [empty, ip_proto, host, transport, port] = parts.as_slice() else {
        return Err(invalid("expected /<ip4|ip6>/<host>/tcp/<port>"));
    };
    if !empty.is_empty() {
        return Err(invalid("multiaddr must start with '/'"));
    }
    if !matches!(*ip_proto, "ip4" | "ip6") {
        return Err(invalid("only ip4 and ip6 addresses are supported"));
    }
    if *transport != "tcp" {
        return Err(invalid("only tcp listeners are supported"));
    }

    let ip: IpAddr = host
        .parse()
        .map_err(|_| invalid(&format!("'{host}' is not an IP address")))?;
    if ip.is_ipv4() != (*ip_proto == "ip4") {
        return Err(invalid("IP version does not match the address protocol"));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| invalid(&format!("'{port}' is not a port number")))?;

    Ok(SocketAddr::new(ip, port))
}

/// The multiaddr form of a bound socket address, for announcing.
pub fn to_multiaddr(addr: SocketAddr) -> String {
    match addr.ip() {
        IpAddr::V4(ip) => format!("/ip4/{ip}/tcp/{}", addr.port()),
        IpAddr::V6(ip) => format!("/ip6/{ip}/tcp/{}", addr.port()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip4_tcp_multiaddr() {
        let addr = parse_listen_addr("/ip4/127.0.0.1/tcp/5002").unwrap();
        assert_eq!(addr, "127.0.0.1:5002".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn parses_ip6_tcp_multiaddr() {
        let addr = parse_listen_addr("/ip6/::1/tcp/8080").unwrap();
        assert_eq!(addr, "[::1]:8080".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn ephemeral_port_is_allowed() {
        let addr = parse_listen_addr("/ip4/127.0.0.1/tcp/0").unwrap();
        assert_eq!(addr.port(), 0);
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in [
            "",
            "127.0.0.1:5002",
            "ip4/127.0.0.1/tcp/5002",
            "/ip4/127.0.0.1/udp/5002",
            "/dns4/localhost/tcp/5002",
            "/ip4/not-an-ip/tcp/5002",
            "/ip4/127.0.0.1/tcp/notaport",
            "/ip4/127.0.0.1/tcp/5002/extra",
            "/ip6/127.0.0.1/tcp/5002",
        ] {
            assert!(parse_listen_addr(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn multiaddr_roundtrip() {
        let addr = "127.0.0.1:5002".parse::<SocketAddr>().unwrap();
        assert_eq!(to_multiaddr(addr), "/ip4/127.0.0.1/tcp/5002");
        assert_eq!(parse_listen_addr(&to_multiaddr(addr)).unwrap(), addr);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: NodeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_sections_fill_defaults() {
        let config: NodeConfig = toml::from_str("[remote]\nport = 9001\n").unwrap();
        assert_eq!(config.addresses, Addresses::default());
        assert_eq!(config.remote.port, 9001);
    }
}
