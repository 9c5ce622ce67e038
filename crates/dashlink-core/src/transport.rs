//! Transport abstraction for the sensor relay
//!
//! Both physical links expose the same service contract to the UI layer;
//! this trait is that contract. The discovery and handshake specifics stay
//! inside each implementation (BLE scans and speaks GATT, WiFi dials a
//! known address and speaks WebSocket) but the lifecycle, callbacks, and
//! send/receive semantics are identical from the caller's side.

use async_trait::async_trait;

use crate::errors::Result;
use crate::session::{ConnectionCallback, DataCallback, DeviceFoundCallback, LinkState};
use crate::types::{LinkKind, LinkRole, PeerDevice, SensorSample};

// ----------------------------------------------------------------------------
// SensorLink Trait
// ----------------------------------------------------------------------------

/// Unified service interface over one physical link.
///
/// Instances are explicitly constructed and injected into the UI layer; the
/// application controller owns their lifecycle and calls [`destroy`] on
/// teardown. The design assumes a single logical owner issuing mutating
/// calls; concurrent multi-caller mutation is out of contract.
///
/// [`destroy`]: SensorLink::destroy
#[async_trait]
pub trait SensorLink: Send {
    /// Begin discovery of candidate peers; `on_device_found` fires at most
    /// once per distinct device per scan session. Fails when the transport
    /// has no broadcast discovery or the radio cannot scan.
    async fn start_scanning(&mut self, on_device_found: DeviceFoundCallback) -> Result<()>;

    /// Cancel an in-flight discovery; safe to call when not scanning. Does
    /// not cancel an in-flight connect.
    async fn stop_scanning(&mut self);

    /// Connect to a discovered (or directly addressed) peer. Single-flight:
    /// a second call while one is outstanding fails immediately. On success
    /// the connection callback has fired with `(true, name)`.
    async fn connect(&mut self, device: &PeerDevice) -> Result<()>;

    /// Relay one sample over the live link. Fails without side effects when
    /// the link is down; a single failed send does not tear the link down.
    async fn send_sample(&mut self, sample: &SensorSample) -> Result<()>;

    /// Close the active connection, firing `(false, None)` once. Safe to
    /// call when not connected.
    async fn disconnect(&mut self);

    /// Stop scanning, close any connection, release the underlying radio or
    /// socket, and clear callbacks. Idempotent.
    async fn destroy(&mut self);

    /// Register the data callback (single slot, overwrites the previous one)
    fn set_on_data_received(&mut self, callback: DataCallback);

    /// Register the connection-state callback (single slot, overwrites the
    /// previous one)
    fn set_on_connection_change(&mut self, callback: ConnectionCallback);

    fn is_connected(&self) -> bool;

    /// Current role, `None` until a connection decides it
    fn role(&self) -> Option<LinkRole>;

    fn state(&self) -> LinkState;

    fn capabilities(&self) -> LinkCapabilities;
}

// ----------------------------------------------------------------------------
// Link Capabilities
// ----------------------------------------------------------------------------

/// What a link can and cannot do, for the UI to adapt its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCapabilities {
    pub kind: LinkKind,
    /// Whether peers are found by scanning (BLE) or addressed manually (WiFi)
    pub supports_discovery: bool,
    /// Whether sends are acknowledged by the remote end
    pub acknowledged_delivery: bool,
    /// Whether the link needs a shared local network
    pub requires_network: bool,
}

impl LinkCapabilities {
    pub const BLE: Self = Self {
        kind: LinkKind::Ble,
        supports_discovery: true,
        acknowledged_delivery: true,
        requires_network: false,
    };

    pub const WIFI: Self = Self {
        kind: LinkKind::Wifi,
        supports_discovery: false,
        acknowledged_delivery: false,
        requires_network: true,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_distinguish_links() {
        assert!(LinkCapabilities::BLE.supports_discovery);
        assert!(LinkCapabilities::BLE.acknowledged_delivery);
        assert!(!LinkCapabilities::WIFI.supports_discovery);
        assert!(LinkCapabilities::WIFI.requires_network);
    }
}
