//! Core types for the dashlink sensor relay
//!
//! The sample record mirrors the wire shape exactly: a flat JSON object with
//! mandatory attitude fields and optional GPS-derived fields.

use core::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Sensor Sample
// ----------------------------------------------------------------------------

/// One relayed sensor reading.
///
/// Constructed by the sender immediately before each transmission and handed
/// to the receiver's data callback; never persisted. All present fields must
/// be finite; the codec refuses to put NaN or infinity on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    /// Pitch in degrees, signed
    pub pitch: f64,
    /// Roll in degrees, signed
    pub roll: f64,
    /// Altitude in meters, when a GPS fix is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Speed in km/h, when a GPS fix is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

impl SensorSample {
    /// Create a sample carrying only attitude
    pub fn new(pitch: f64, roll: f64) -> Self {
        Self {
            pitch,
            roll,
            altitude: None,
            speed: None,
        }
    }

    /// Attach an altitude reading (meters)
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Attach a speed reading (km/h)
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Whether every present field is a finite number
    pub fn is_finite(&self) -> bool {
        self.pitch.is_finite()
            && self.roll.is_finite()
            && self.altitude.map_or(true, f64::is_finite)
            && self.speed.map_or(true, f64::is_finite)
    }
}

// ----------------------------------------------------------------------------
// Peer Devices
// ----------------------------------------------------------------------------

/// Transport-specific address of a remote endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerAddress {
    /// Platform peripheral identifier, stable per discovery session
    Ble(String),
    /// Socket peer on the local network
    Ip(IpAddr),
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerAddress::Ble(id) => write!(f, "{id}"),
            PeerAddress::Ip(ip) => write!(f, "{ip}"),
        }
    }
}

/// A discovered remote endpoint.
///
/// Created when a discovery event matches the expected service signature;
/// stale once discovery restarts. A successful connect promotes it to the
/// session's active connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerDevice {
    /// Opaque identifier, stable within one discovery session
    pub id: String,
    /// Human-readable advertised name
    pub name: String,
    /// How to reach the device
    pub address: PeerAddress,
}

impl PeerDevice {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: PeerAddress) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address,
        }
    }
}

// ----------------------------------------------------------------------------
// Roles and Link Kinds
// ----------------------------------------------------------------------------

/// Which side of the relay this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkRole {
    /// Originates samples from a live sensor
    Sender,
    /// Displays relayed samples
    Receiver,
}

impl fmt::Display for LinkRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkRole::Sender => write!(f, "sender"),
            LinkRole::Receiver => write!(f, "receiver"),
        }
    }
}

/// Physical link a transport runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    /// Bluetooth Low Energy (GATT)
    Ble,
    /// Local WiFi (WebSocket)
    Wifi,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkKind::Ble => write!(f, "ble"),
            LinkKind::Wifi => write!(f, "wifi"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_builders_attach_optional_fields() {
        let sample = SensorSample::new(12.0, -3.0).with_altitude(500.0).with_speed(40.0);
        assert_eq!(sample.altitude, Some(500.0));
        assert_eq!(sample.speed, Some(40.0));
    }

    #[test]
    fn finite_check_rejects_nan_and_infinity() {
        assert!(SensorSample::new(1.0, 2.0).is_finite());
        assert!(!SensorSample::new(f64::NAN, 2.0).is_finite());
        assert!(!SensorSample::new(1.0, f64::INFINITY).is_finite());
        assert!(!SensorSample::new(1.0, 2.0).with_speed(f64::NAN).is_finite());
    }

    #[test]
    fn role_and_kind_display_as_wire_names() {
        assert_eq!(LinkRole::Sender.to_string(), "sender");
        assert_eq!(LinkRole::Receiver.to_string(), "receiver");
        assert_eq!(LinkKind::Ble.to_string(), "ble");
        assert_eq!(LinkKind::Wifi.to_string(), "wifi");
    }
}
