//! Bluetooth Low Energy transport for the dashlink sensor relay
//!
//! Implements the [`SensorLink`] contract from `dashlink-core` over GATT:
//! receivers scan for the dashboard service, connect, and subscribe to the
//! sensor characteristic; senders advertise the service and notify samples
//! to the subscribed receiver.
//!
//! ## Modules
//!
//! - [`config`] - Transport configuration and settings
//! - [`error`] - BLE-specific error types and btleplug classification
//! - [`protocol`] - Service/characteristic UUIDs and name matching
//! - [`discovery`] - Device scanning with per-session dedup and auto-stop
//! - [`connection`] - Handshake, notification streaming, characteristic writes
//! - [`advertising`] - Sender-side GATT service hosting (Linux/BlueZ)
//! - [`service`] - The `BleSensorLink` facade
//!
//! ## Platform Support
//!
//! Scanning and connecting work wherever btleplug has a central backend.
//! Advertising requires BlueZ and is therefore Linux-only; other platforms
//! report the capability as unavailable.

mod advertising;
mod config;
mod connection;
mod discovery;
mod error;
mod protocol;
mod service;

// Public API exports
pub use config::BleLinkConfig;
pub use error::BleLinkError;
pub use protocol::{
    DEVICE_NAME, DEVICE_NAME_PREFIX, SENSOR_DATA_CHARACTERISTIC_UUID, SENSOR_SERVICE_UUID,
};
pub use service::BleSensorLink;

// Re-export the transport trait for convenience
pub use dashlink_core::SensorLink;
