//! Scan target: an opaque host paired with a single port.
//!
//! The host is never validated here. [`resolve_host`] accepts literal
//! IPv4/IPv6 addresses and hands anything else to [`ToSocketAddrs`] for a
//! system lookup.

use crate::types::Port;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

/// One (host, port) pair to be probed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// Hostname or literal IP, exactly as the caller supplied it.
    pub host: String,
    /// Port to connect to.
    pub port: Port,
}

impl ScanTarget {
    /// Create a new scan target.
    pub fn new(host: impl Into<String>, port: Port) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Resolve the target into socket addresses.
    pub fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        Ok(resolve_host(&self.host)?
            .into_iter()
            .map(|ip| SocketAddr::new(ip, self.port.as_u16()))
            .collect())
    }
}

/// Resolve a host into IP addresses, in the order the resolver returned them.
///
/// An empty resolution is reported as an `AddrNotAvailable` error so that
/// callers only have to deal with one failure channel.
pub fn resolve_host(host: &str) -> io::Result<Vec<IpAddr>> {
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    let addrs: Vec<IpAddr> = match bare.parse::<IpAddr>() {
        Ok(ip) => vec![ip],
        Err(_) => (bare, 0).to_socket_addrs()?.map(|a| a.ip()).collect(),
    };

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses found for host '{}'", host),
        ));
    }
    Ok(addrs)
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
