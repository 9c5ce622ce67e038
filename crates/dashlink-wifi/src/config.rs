//! WiFi transport configuration

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Well-known port the sender listens on
pub const SENSOR_PORT: u16 = 8765;

/// Configuration for the WiFi link
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WifiLinkConfig {
    /// Port of the sender's WebSocket listener
    pub port: u16,
    /// Maximum time to wait for the WebSocket handshake
    pub connect_timeout: Duration,
    /// Address the sender binds its listener to
    pub bind_addr: IpAddr,
}

impl Default for WifiLinkConfig {
    fn default() -> Self {
        Self {
            port: SENSOR_PORT,
            connect_timeout: Duration::from_secs(10),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        }
    }
}

impl WifiLinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the listener port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the handshake timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the listener bind address
    pub fn with_bind_addr(mut self, addr: IpAddr) -> Self {
        self.bind_addr = addr;
        self
    }
}
