//! The BLE service facade exposed to the UI layer

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use btleplug::platform::Peripheral;
use dashlink_core::session::{ConnectionCallback, DataCallback, DeviceFoundCallback};
use dashlink_core::{
    LinkCapabilities, LinkError, LinkRole, LinkSession, LinkState, PeerDevice, Result, SensorLink,
    SensorSample, SharedSession,
};
use tracing::info;

use crate::advertising::BleAdvertiser;
use crate::config::BleLinkConfig;
use crate::connection::BleConnection;
use crate::discovery::BleDiscovery;
use crate::error::BleLinkError;

// ----------------------------------------------------------------------------
// BLE Sensor Link
// ----------------------------------------------------------------------------

/// One BLE transport instance.
///
/// Explicitly constructed and injected into the UI layer; the application
/// controller owns it and must call `destroy` on teardown. Receivers scan,
/// connect and subscribe; senders advertise the service and push
/// notifications.
pub struct BleSensorLink {
    config: BleLinkConfig,
    session: SharedSession,
    discovery: BleDiscovery,
    connection: BleConnection,
    advertiser: BleAdvertiser,
    discovered: Arc<Mutex<HashMap<String, Peripheral>>>,
}

impl Default for BleSensorLink {
    fn default() -> Self {
        Self::new(BleLinkConfig::default())
    }
}

impl BleSensorLink {
    pub fn new(config: BleLinkConfig) -> Self {
        Self {
            session: LinkSession::shared(),
            discovery: BleDiscovery::new(config.clone()),
            connection: BleConnection::new(config.clone()),
            advertiser: BleAdvertiser::new(config.clone()),
            discovered: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &BleLinkConfig {
        &self.config
    }

    /// Bring up the radio before any scan or connect. Resolves only once
    /// the adapter reports powered-on; a powered-off radio and a denied
    /// permission reject with distinct errors.
    pub async fn initialize(&mut self) -> Result<()> {
        self.discovery.initialize().await
    }

    /// Sender mode: advertise the dashboard service and host the sensor
    /// characteristic. The link counts as connected once a receiver
    /// subscribes.
    pub async fn start_advertising(&mut self) -> Result<()> {
        self.advertiser.start(self.session.clone()).await
    }

    /// Stop advertising and drop any subscriber
    pub async fn stop_advertising(&mut self) {
        self.advertiser.stop().await;
    }
}

#[async_trait]
impl SensorLink for BleSensorLink {
    async fn start_scanning(&mut self, on_device_found: DeviceFoundCallback) -> Result<()> {
        self.session.lock().unwrap().begin_scan()?;
        // a restarted discovery invalidates previously found devices
        self.discovered.lock().unwrap().clear();
        let started = self
            .discovery
            .start(
                on_device_found,
                Arc::clone(&self.discovered),
                self.session.clone(),
            )
            .await;
        if started.is_err() {
            self.session.lock().unwrap().end_scan();
        }
        started
    }

    async fn stop_scanning(&mut self) {
        self.discovery.stop().await;
        self.session.lock().unwrap().end_scan();
    }

    async fn connect(&mut self, device: &PeerDevice) -> Result<()> {
        // never scan and connect simultaneously
        self.stop_scanning().await;
        self.session
            .lock()
            .unwrap()
            .begin_connect(LinkRole::Receiver)?;

        let peripheral = self.discovered.lock().unwrap().get(&device.id).cloned();
        let Some(peripheral) = peripheral else {
            self.session.lock().unwrap().fail_connect();
            return Err(BleLinkError::UnknownDevice(device.id.clone()).into());
        };
        let Some(adapter) = self.discovery.adapter().cloned() else {
            self.session.lock().unwrap().fail_connect();
            return Err(LinkError::adapter_unavailable("adapter not initialized"));
        };

        match self
            .connection
            .establish(&adapter, peripheral, &device.name, self.session.clone())
            .await
        {
            Ok(()) => {
                self.session.lock().unwrap().complete_connect(&device.name)?;
                info!(peer = %device.name, "BLE link established");
                Ok(())
            }
            Err(e) => {
                self.session.lock().unwrap().fail_connect();
                Err(e)
            }
        }
    }

    async fn send_sample(&mut self, sample: &SensorSample) -> Result<()> {
        if !self.session.lock().unwrap().is_connected() {
            return Err(LinkError::NotConnected);
        }
        if self.advertiser.is_advertising() {
            self.advertiser.notify_sample(sample).await
        } else {
            self.connection.send(sample).await
        }
    }

    async fn disconnect(&mut self) {
        if self.connection.is_open() {
            self.connection.close(&self.session).await;
        }
    }

    async fn destroy(&mut self) {
        self.stop_scanning().await;
        self.connection.close(&self.session).await;
        self.advertiser.stop().await;
        self.discovery.release();
        self.discovered.lock().unwrap().clear();
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
        LinkCapabilities::BLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_without_connection_is_refused() {
        let mut link = BleSensorLink::default();
        let result = link.send_sample(&SensorSample::new(1.0, 2.0)).await;
        assert!(matches!(result, Err(LinkError::NotConnected)));
    }

    #[tokio::test]
    async fn fresh_link_is_idle_with_no_role() {
        let link = BleSensorLink::default();
        assert!(!link.is_connected());
        assert_eq!(link.role(), None);
        assert_eq!(link.state(), LinkState::Idle);
        assert!(link.capabilities().supports_discovery);
        assert!(link.capabilities().acknowledged_delivery);
    }

    #[tokio::test]
    async fn destroy_is_idempotent_when_never_connected() {
        let mut link = BleSensorLink::default();
        link.destroy().await;
        link.destroy().await;
        assert!(!link.is_connected());
    }
}
