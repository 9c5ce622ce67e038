//! Core protocol types and link lifecycle for the dashlink sensor relay
//!
//! dashlink relays a small sensor-sample record ({pitch, roll, altitude,
//! speed}) from a device with a working motion sensor (the "sender") to a
//! device without one (the "receiver"). This crate holds everything the
//! concrete transports share:
//!
//! - [`types`] - Sensor samples, peer devices, roles and link kinds
//! - [`codec`] - The JSON wire frame and its base64 form for BLE
//! - [`errors`] - Error taxonomy for the link layer
//! - [`session`] - Connection-lifecycle state machine and callback slots
//! - [`transport`] - The `SensorLink` trait implemented by each transport
//! - [`sensor`] - Attitude/speed math applied to raw sensor readings
//!
//! Transports (`dashlink-ble`, `dashlink-wifi`) implement [`SensorLink`]
//! on top of [`LinkSession`], so the lifecycle invariants (single active
//! connection, exactly-once state callbacks, data only while connected)
//! live in one place.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod codec;
pub mod errors;
pub mod sensor;
pub mod session;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use errors::{LinkError, Result};
pub use session::{
    ConnectionCallback, DataCallback, DeviceFoundCallback, LinkSession, LinkState, SharedSession,
};
pub use transport::{LinkCapabilities, SensorLink};
pub use types::{LinkKind, LinkRole, PeerAddress, PeerDevice, SensorSample};
