//! The WiFi service facade exposed to the UI layer

use std::net::{IpAddr, SocketAddr};

use async_trait::async_trait;
use dashlink_core::session::{ConnectionCallback, DataCallback, DeviceFoundCallback};
use dashlink_core::{
    LinkCapabilities, LinkError, LinkRole, LinkSession, LinkState, PeerAddress, PeerDevice,
    Result, SensorLink, SensorSample, SharedSession,
};
use tracing::info;

use crate::client::WsClient;
use crate::config::WifiLinkConfig;
use crate::error::WifiLinkError;
use crate::server::WsServer;

// ----------------------------------------------------------------------------
// WiFi Sensor Link
// ----------------------------------------------------------------------------

/// One WiFi transport instance.
///
/// There is no broadcast discovery on this link; the receiver dials the
/// sender's IP directly. Receivers use [`connect_to_server`]; senders bind
/// the well-known port with [`start_server`] and stream to whoever connects.
///
/// [`connect_to_server`]: WifiSensorLink::connect_to_server
/// [`start_server`]: WifiSensorLink::start_server
pub struct WifiSensorLink {
    config: WifiLinkConfig,
    session: SharedSession,
    client: Option<WsClient>,
    server: Option<WsServer>,
}

impl Default for WifiSensorLink {
    fn default() -> Self {
        Self::new(WifiLinkConfig::default())
    }
}

impl WifiSensorLink {
    pub fn new(config: WifiLinkConfig) -> Self {
        Self {
            config,
            session: LinkSession::shared(),
            client: None,
            server: None,
        }
    }

    pub fn config(&self) -> &WifiLinkConfig {
        &self.config
    }

    /// Frames dropped so far (malformed or arrived while not connected)
    pub fn dropped_frames(&self) -> u64 {
        self.session.lock().unwrap().dropped_frames()
    }

    /// Receiver mode: dial the sender at `ip` on the configured port
    pub async fn connect_to_server(&mut self, ip: &str) -> Result<()> {
        let ip: IpAddr = ip
            .parse()
            .map_err(|_| WifiLinkError::InvalidAddress(ip.to_string()))?;
        let device = PeerDevice::new(ip.to_string(), ip.to_string(), PeerAddress::Ip(ip));
        self.connect(&device).await
    }

    /// Sender mode: bind the listener and wait for a receiver. Returns the
    /// bound address.
    pub async fn start_server(&mut self) -> Result<SocketAddr> {
        if let Some(server) = &self.server {
            return Ok(server.local_addr());
        }
        let addr = SocketAddr::new(self.config.bind_addr, self.config.port);
        let server = WsServer::bind(addr, self.session.clone()).await?;
        let local_addr = server.local_addr();
        self.server = Some(server);
        Ok(local_addr)
    }

    /// The listener's bound address, when serving
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(|s| s.local_addr())
    }
}

#[async_trait]
impl SensorLink for WifiSensorLink {
    async fn start_scanning(&mut self, _on_device_found: DeviceFoundCallback) -> Result<()> {
        // peers are addressed manually on this link
        Err(LinkError::DiscoveryUnsupported)
    }

    async fn stop_scanning(&mut self) {}

    async fn connect(&mut self, device: &PeerDevice) -> Result<()> {
        let ip = match device.address {
            PeerAddress::Ip(ip) => ip,
            PeerAddress::Ble(_) => {
                return Err(LinkError::connect_failed(
                    device.name.clone(),
                    "not a network peer",
                ))
            }
        };

        self.session
            .lock()
            .unwrap()
            .begin_connect(LinkRole::Receiver)?;

        match WsClient::connect(ip, &self.config, self.session.clone()).await {
            Ok(client) => {
                self.client = Some(client);
                self.session
                    .lock()
                    .unwrap()
                    .complete_connect(&ip.to_string())?;
                info!(server = %ip, "WiFi link established");
                Ok(())
            }
            Err(e) => {
                self.session.lock().unwrap().fail_connect();
                Err(e)
            }
        }
    }

    async fn send_sample(&mut self, sample: &SensorSample) -> Result<()> {
        // readiness check: fail without touching the socket when down
        if !self.session.lock().unwrap().is_connected() {
            return Err(LinkError::NotConnected);
        }
        if let Some(server) = &self.server {
            server.send(sample).await
        } else if let Some(client) = self.client.as_mut() {
            client.send(sample).await
        } else {
            Err(LinkError::NotConnected)
        }
    }

    async fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            client.close().await;
            self.session.lock().unwrap().mark_disconnected();
        }
        if let Some(server) = self.server.take() {
            server.shutdown().await;
        }
    }

    async fn destroy(&mut self) {
        self.disconnect().await;
        self.session.lock().unwrap().clear_callbacks();
    }

    fn set_on_data_received(&mut self, callback: DataCallback) {
        self.session.lock().unwrap().set_on_data(callback);
    }

    fn set_on_connection_change(&mut self, callback: ConnectionCallback) {
        self.session.lock().unwrap().set_on_connection_change(callback);
    }

    fn is_connected(&self) -> bool {
        self.session.lock().unwrap().is_connected()
    }

    fn role(&self) -> Option<LinkRole> {
        self.session.lock().unwrap().role()
    }

    fn state(&self) -> LinkState {
        self.session.lock().unwrap().state()
    }

    fn capabilities(&self) -> LinkCapabilities {
        LinkCapabilities::WIFI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_without_connection_is_refused() {
        let mut link = WifiSensorLink::default();
        let result = link.send_sample(&SensorSample::new(1.0, 2.0)).await;
        assert!(matches!(result, Err(LinkError::NotConnected)));
        assert!(!link.is_connected());
    }

    #[tokio::test]
    async fn scanning_is_unsupported() {
        let mut link = WifiSensorLink::default();
        let result = link.start_scanning(Box::new(|_| {})).await;
        assert!(matches!(result, Err(LinkError::DiscoveryUnsupported)));
    }

    #[tokio::test]
    async fn invalid_server_address_is_rejected() {
        let mut link = WifiSensorLink::default();
        let result = link.connect_to_server("not-an-ip").await;
        assert!(result.is_err());
        assert_eq!(link.state(), LinkState::Idle);
    }
}
