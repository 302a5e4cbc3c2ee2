//! # Scan Target Model
//!
//! A [`Target`] is one `address:port` combination produced by enumeration.
//! It has no identity beyond its string value and is immutable once built.

use std::fmt;
use std::net::SocketAddr;

use crate::error::ProbeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    address: String,
    port: String,
}

impl Target {
    pub fn new(address: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            port: port.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn port_number(&self) -> Result<u16, ProbeError> {
        self.port
            .parse::<u16>()
            .map_err(|_| ProbeError::InvalidTarget(format!("'{}' is not a port", self.port)))
    }

    /// Resolves the target, keeping IPv6 literals intact (no `[..]` needed).
    pub async fn socket_addrs(&self) -> Result<Vec<SocketAddr>, ProbeError> {
        let port = self.port_number()?;
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((self.address.as_str(), port))
            .await
            .map_err(|e| ProbeError::Unreachable(format!("{}: {e}", self.address)))?
            .collect();

        if addrs.is_empty() {
            return Err(ProbeError::Unreachable(format!(
                "{} resolved to no addresses",
                self.address
            )));
        }
        Ok(addrs)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
