//! Local-network WebSocket transport for the dashlink sensor relay
//!
//! Implements the [`SensorLink`] contract from `dashlink-core` over plain
//! WebSocket text frames on the local network: the sender listens on the
//! well-known sensor port, the receiver dials the sender's IP directly
//! (there is no broadcast discovery), and each frame is one JSON sample.
//!
//! ## Modules
//!
//! - [`config`] - Port, bind address, and handshake timeout
//! - [`error`] - WiFi-specific error types
//! - [`client`] - Receiver-side WebSocket client
//! - [`server`] - Sender-side single-client listener
//! - [`service`] - The `WifiSensorLink` facade

mod client;
mod config;
mod error;
mod server;
mod service;

// Public API exports
pub use config::{WifiLinkConfig, SENSOR_PORT};
pub use error::WifiLinkError;
pub use service::WifiSensorLink;

// Re-export the transport trait for convenience
pub use dashlink_core::SensorLink;
