//! Subcommand implementations and the shared endpoint-resolution helper.

pub mod benchmark;
pub mod fetch;
pub mod interest;
pub mod publish;
pub mod register;

use anyhow::{bail, Result};
use rust_udcn_face::ConnectionInfo;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Parses the `--endpoint` flag, falling back to the platform default
/// (well-known Unix socket, else loopback TCP) when unset.
pub fn resolve_connection_info(endpoint: Option<&str>) -> Result<ConnectionInfo> {
    let Some(endpoint) = endpoint else {
        return Ok(rust_udcn_face::transport::default_connection_info());
    };

    if let Some(path) = endpoint.strip_prefix("unix://") {
        return Ok(ConnectionInfo::Unix(PathBuf::from(path)));
    }
    if let Some(addr) = endpoint.strip_prefix("tcp://") {
        let socket_addr: SocketAddr = addr.parse()?;
        return Ok(ConnectionInfo::Tcp(socket_addr));
    }
    if let Some(rest) = endpoint.strip_prefix("ws://") {
        let (host, port) = rest
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("expected ws://host:port"))?;
        return Ok(ConnectionInfo::WebSocket {
            host: host.to_string(),
            port: port.parse()?,
        });
    }

    bail!("unrecognized endpoint scheme in `{endpoint}`; expected unix://, tcp://, or ws://")
}
