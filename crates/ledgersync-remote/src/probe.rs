//! Network status probe
//!
//! Connectivity is checked with a short TCP connect to the gateway's host
//! and port. Meteredness is not observable from userland on most platforms,
//! so it comes from configuration (`network.assume_metered`), optionally
//! overridden per CLI invocation.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use ledgersync_core::ports::INetworkProbe;

/// Probes reachability of the remote gateway with a TCP connect
pub struct TcpNetworkProbe {
    host: String,
    port: u16,
    timeout: Duration,
    assume_metered: bool,
}

impl TcpNetworkProbe {
    /// Creates a probe for the host/port of the gateway base URL
    pub fn from_base_url(base_url: &str, timeout: Duration, assume_metered: bool) -> Result<Self> {
        let url = url::Url::parse(base_url)
            .with_context(|| format!("Invalid remote base URL: {base_url}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("Remote base URL has no host: {base_url}"))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| anyhow!("Remote base URL has no port: {base_url}"))?;

        Ok(Self {
            host,
            port,
            timeout,
            assume_metered,
        })
    }

    /// Probe host name
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Probe port
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl INetworkProbe for TcpNetworkProbe {
    fn is_online(&self) -> bool {
        let addrs = match (self.host.as_str(), self.port).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(err) => {
                debug!(host = %self.host, error = %err, "DNS resolution failed; treating as offline");
                return false;
            }
        };

        for addr in addrs {
            if TcpStream::connect_timeout(&addr, self.timeout).is_ok() {
                return true;
            }
        }
        debug!(host = %self.host, port = self.port, "TCP probe failed; offline");
        false
    }

    fn is_unmetered(&self) -> bool {
        !self.assume_metered && self.is_online()
    }
}
