//! BLE connection management and data transmission
//!
//! Handles the receiver-side handshake: platform connect, GATT service
//! discovery, locating the sensor characteristic, subscribing to its
//! notifications, and watching for the remote-initiated disconnect. The
//! sender-side characteristic write (acknowledged) lives here too.

use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _, WriteType};
use btleplug::platform::{Adapter, Peripheral};
use dashlink_core::{codec, Result, SharedSession};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::BleLinkConfig;
use crate::error::{classify_connect_error, BleLinkError};
use crate::protocol::{SENSOR_DATA_CHARACTERISTIC_UUID, SENSOR_SERVICE_UUID};

// ----------------------------------------------------------------------------
// Connection
// ----------------------------------------------------------------------------

/// The live GATT link to one remote dashboard peer
pub struct BleConnection {
    config: BleLinkConfig,
    peripheral: Option<Peripheral>,
    sensor_char: Option<Characteristic>,
    notify_task: Option<JoinHandle<()>>,
    watch_task: Option<JoinHandle<()>>,
}

impl BleConnection {
    pub fn new(config: BleLinkConfig) -> Self {
        Self {
            config,
            peripheral: None,
            sensor_char: None,
            notify_task: None,
            watch_task: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.peripheral.is_some()
    }

    /// Run the transport-level handshake against an already-discovered
    /// peripheral. On success the notification loop and the disconnect
    /// watcher are running; the caller announces the state change.
    pub async fn establish(
        &mut self,
        adapter: &Adapter,
        peripheral: Peripheral,
        peer_name: &str,
        session: SharedSession,
    ) -> Result<()> {
        match timeout(self.config.connection_timeout, peripheral.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(classify_connect_error(peer_name, e).into()),
            Err(_) => {
                return Err(BleLinkError::ConnectTimeout(self.config.connection_timeout).into())
            }
        }
        info!(peer = peer_name, "connected, discovering services");

        if let Err(e) = peripheral.discover_services().await {
            let _ = peripheral.disconnect().await;
            return Err(BleLinkError::ServiceDiscovery(e.to_string()).into());
        }

        let sensor_char = peripheral
            .characteristics()
            .into_iter()
            .find(|c| {
                c.uuid == SENSOR_DATA_CHARACTERISTIC_UUID && c.service_uuid == SENSOR_SERVICE_UUID
            })
            .ok_or_else(|| BleLinkError::MissingCharacteristic(peer_name.to_string()))?;

        peripheral
            .subscribe(&sensor_char)
            .await
            .map_err(|e| BleLinkError::Subscribe(e.to_string()))?;

        let mut notifications = peripheral
            .notifications()
            .await
            .map_err(|e| BleLinkError::Subscribe(e.to_string()))?;

        // Forward every decodable frame; corrupt ones are counted, never fatal.
        let notify_session = session.clone();
        self.notify_task = Some(tokio::spawn(async move {
            while let Some(notification) = notifications.next().await {
                if notification.uuid != SENSOR_DATA_CHARACTERISTIC_UUID {
                    continue;
                }
                match codec::decode_ble(&notification.value) {
                    Some(sample) => {
                        notify_session.lock().unwrap().deliver(sample);
                    }
                    None => notify_session.lock().unwrap().note_dropped(),
                }
            }
            debug!("notification stream ended");
        }));

        // Watch for the remote-initiated close.
        let watched_id = peripheral.id();
        let mut events = adapter
            .events()
            .await
            .map_err(|e| BleLinkError::Subscribe(e.to_string()))?;
        let watch_session = session.clone();
        self.watch_task = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDisconnected(id) = event {
                    if id == watched_id {
                        info!("remote closed the connection");
                        watch_session.lock().unwrap().mark_disconnected();
                        break;
                    }
                }
            }
        }));

        self.peripheral = Some(peripheral);
        self.sensor_char = Some(sensor_char);
        Ok(())
    }

    /// Acknowledged characteristic write of one encoded sample.
    ///
    /// A failed write is reported to the caller; the link itself stays up
    /// unless the platform separately reports it closed.
    pub async fn send(&self, sample: &dashlink_core::SensorSample) -> Result<()> {
        let (peripheral, sensor_char) = match (&self.peripheral, &self.sensor_char) {
            (Some(p), Some(c)) => (p, c),
            _ => return Err(dashlink_core::LinkError::NotConnected),
        };
        let payload = codec::encode_ble(sample)?;
        peripheral
            .write(sensor_char, payload.as_bytes(), WriteType::WithResponse)
            .await
            .map_err(|e| BleLinkError::Write(e.to_string()))?;
        Ok(())
    }

    /// Close the link and announce the disconnect (once)
    pub async fn close(&mut self, session: &SharedSession) {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
        if let Some(task) = self.watch_task.take() {
            task.abort();
        }
        if let Some(peripheral) = self.peripheral.take() {
            if let Err(e) = peripheral.disconnect().await {
                warn!("disconnect failed: {e}");
            }
        }
        self.sensor_char = None;
        session.lock().unwrap().mark_disconnected();
    }
}
