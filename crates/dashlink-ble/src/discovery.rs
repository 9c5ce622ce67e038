//! BLE device discovery and scanning
//!
//! Scans filtered by the dashboard service UUID, surfaces each matching
//! device at most once per scan session, and auto-stops after the configured
//! timeout when nobody calls `stop` first.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use btleplug::api::{Central, CentralEvent, CentralState, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use dashlink_core::{PeerAddress, PeerDevice, Result, SharedSession};
use dashlink_core::session::DeviceFoundCallback;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::BleLinkConfig;
use crate::error::{classify_adapter_error, BleLinkError};
use crate::protocol::{is_dashboard_name, SENSOR_SERVICE_UUID};

// ----------------------------------------------------------------------------
// Scan Session
// ----------------------------------------------------------------------------

/// Per-scan dedup of advertisement events.
///
/// The platform delivers discovery and update events repeatedly for the same
/// device; a device is surfaced once per session, and only when its
/// advertised name carries the dashboard prefix.
pub(crate) struct ScanSession {
    prefix: String,
    seen: HashSet<String>,
}

impl ScanSession {
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seen: HashSet::new(),
        }
    }

    /// Whether this event should be surfaced to the caller
    pub(crate) fn observe(&mut self, device_id: &str, name: &str) -> bool {
        if !is_dashboard_name(name, &self.prefix) {
            return false;
        }
        self.seen.insert(device_id.to_string())
    }
}

// ----------------------------------------------------------------------------
// Discovery
// ----------------------------------------------------------------------------

/// Owns the BLE adapter and the scan task
pub struct BleDiscovery {
    config: BleLinkConfig,
    adapter: Option<Adapter>,
    scan_task: Option<JoinHandle<()>>,
}

impl BleDiscovery {
    pub fn new(config: BleLinkConfig) -> Self {
        Self {
            config,
            adapter: None,
            scan_task: None,
        }
    }

    /// Acquire the adapter and confirm the radio is usable.
    ///
    /// Resolves only once the radio reports powered-on; a powered-off radio
    /// and a denied permission produce distinct errors so the caller can
    /// tell the user which one to fix.
    pub async fn initialize(&mut self) -> Result<()> {
        if self.adapter.is_some() {
            return Ok(());
        }

        let manager = Manager::new().await.map_err(classify_adapter_error)?;
        let adapters = manager.adapters().await.map_err(classify_adapter_error)?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| BleLinkError::NoAdapter("no adapters present".to_string()))?;

        match adapter.adapter_state().await.map_err(classify_adapter_error)? {
            CentralState::PoweredOn => {}
            CentralState::PoweredOff => return Err(BleLinkError::PoweredOff.into()),
            state => {
                debug!(?state, "adapter state not conclusive, continuing");
            }
        }

        info!("BLE adapter initialized");
        self.adapter = Some(adapter);
        Ok(())
    }

    pub fn adapter(&self) -> Option<&Adapter> {
        self.adapter.as_ref()
    }

    /// Start scanning for dashboard peers.
    ///
    /// Matching peripherals are recorded in `discovered` (so a later connect
    /// can resolve them) and handed to `on_found` once each. The scan stops
    /// by itself after the configured timeout.
    pub async fn start(
        &mut self,
        mut on_found: DeviceFoundCallback,
        discovered: Arc<Mutex<HashMap<String, Peripheral>>>,
        session: SharedSession,
    ) -> Result<()> {
        self.initialize().await?;
        let adapter = self.adapter.as_ref().unwrap().clone();

        let mut events = adapter
            .events()
            .await
            .map_err(|e| BleLinkError::ScanStart(e.to_string()))?;

        adapter
            .start_scan(ScanFilter {
                services: vec![SENSOR_SERVICE_UUID],
            })
            .await
            .map_err(|e| match e {
                btleplug::Error::PermissionDenied => BleLinkError::PermissionDenied,
                other => BleLinkError::ScanStart(other.to_string()),
            })?;

        info!(timeout = ?self.config.scan_timeout, "started scanning for dashboard peers");

        let scan_timeout = self.config.scan_timeout;
        let prefix = self.config.device_name_prefix.clone();
        let handle = tokio::spawn(async move {
            let mut scan = ScanSession::new(prefix);
            let timeout = tokio::time::sleep(scan_timeout);
            tokio::pin!(timeout);

            loop {
                tokio::select! {
                    _ = &mut timeout => {
                        debug!("scan timeout reached, stopping discovery");
                        break;
                    }
                    event = events.next() => {
                        let Some(event) = event else { break };
                        let id = match event {
                            CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                            _ => continue,
                        };
                        let Ok(peripheral) = adapter.peripheral(&id).await else {
                            continue;
                        };
                        let Ok(Some(properties)) = peripheral.properties().await else {
                            continue;
                        };
                        let Some(name) = properties.local_name else { continue };
                        let address = peripheral.address().to_string();
                        if scan.observe(&address, &name) {
                            info!(%name, %address, "discovered dashboard sensor");
                            discovered
                                .lock()
                                .unwrap()
                                .insert(address.clone(), peripheral);
                            on_found(PeerDevice::new(
                                address.clone(),
                                name,
                                PeerAddress::Ble(address),
                            ));
                        }
                    }
                }
            }

            if let Err(e) = adapter.stop_scan().await {
                warn!("failed to stop scan: {e}");
            }
            session.lock().unwrap().end_scan();
        });

        self.scan_task = Some(handle);
        Ok(())
    }

    /// Cancel an in-flight scan; safe to call when not scanning
    pub async fn stop(&mut self) {
        if let Some(task) = self.scan_task.take() {
            task.abort();
            if let Some(adapter) = &self.adapter {
                if let Err(e) = adapter.stop_scan().await {
                    debug!("stop_scan while not scanning: {e}");
                }
            }
        }
    }

    /// Drop the adapter handle; part of `destroy`
    pub fn release(&mut self) {
        self.adapter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_advertisements_surface_once() {
        let mut scan = ScanSession::new("CarDashboard");
        assert!(scan.observe("AA:BB:CC:DD:EE:FF", "CarDashboard_Sensor"));
        for _ in 0..4 {
            assert!(!scan.observe("AA:BB:CC:DD:EE:FF", "CarDashboard_Sensor"));
        }
    }

    #[test]
    fn distinct_devices_each_surface() {
        let mut scan = ScanSession::new("CarDashboard");
        assert!(scan.observe("AA:BB:CC:DD:EE:01", "CarDashboard_Sensor"));
        assert!(scan.observe("AA:BB:CC:DD:EE:02", "CarDashboard_Sensor"));
    }

    #[test]
    fn foreign_devices_never_surface() {
        let mut scan = ScanSession::new("CarDashboard");
        assert!(!scan.observe("AA:BB:CC:DD:EE:03", "FitnessTracker"));
        assert!(!scan.observe("AA:BB:CC:DD:EE:03", ""));
    }
}
