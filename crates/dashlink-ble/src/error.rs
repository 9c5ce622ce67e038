//! Error types and btleplug error classification for the BLE transport

use std::time::Duration;

use dashlink_core::LinkError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the BLE transport
#[derive(Debug, Error)]
pub enum BleLinkError {
    #[error("no BLE adapter available: {0}")]
    NoAdapter(String),

    #[error("bluetooth radio is powered off")]
    PoweredOff,

    #[error("bluetooth permission denied")]
    PermissionDenied,

    #[error("failed to start scan: {0}")]
    ScanStart(String),

    #[error("device {0} was not discovered in this scan session")]
    UnknownDevice(String),

    #[error("connection to {peer} failed: {reason}")]
    Connect { peer: String, reason: String },

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("service discovery failed: {0}")]
    ServiceDiscovery(String),

    #[error("sensor characteristic not present on {0}")]
    MissingCharacteristic(String),

    #[error("failed to subscribe to notifications: {0}")]
    Subscribe(String),

    #[error("characteristic write failed: {0}")]
    Write(String),

    #[error("advertising unavailable: {0}")]
    Advertising(String),
}

impl From<BleLinkError> for LinkError {
    fn from(err: BleLinkError) -> Self {
        match err {
            BleLinkError::NoAdapter(reason) => LinkError::adapter_unavailable(reason),
            BleLinkError::PoweredOff => LinkError::PoweredOff,
            BleLinkError::PermissionDenied => {
                LinkError::permission_denied("bluetooth access was not granted")
            }
            BleLinkError::ScanStart(reason) => LinkError::scan_failed(reason),
            BleLinkError::UnknownDevice(id) => {
                LinkError::connect_failed(id, "not discovered in this scan session")
            }
            BleLinkError::Connect { peer, reason } => LinkError::connect_failed(peer, reason),
            BleLinkError::ConnectTimeout(duration) => LinkError::ConnectTimeout {
                duration_ms: duration.as_millis() as u64,
            },
            BleLinkError::ServiceDiscovery(reason) => {
                LinkError::ServiceDiscoveryFailed { reason }
            }
            BleLinkError::MissingCharacteristic(peer) => LinkError::CharacteristicNotFound {
                characteristic: format!("sensor data characteristic on {peer}"),
            },
            BleLinkError::Subscribe(reason) => LinkError::SubscribeFailed { reason },
            BleLinkError::Write(reason) => LinkError::write_failed(reason),
            BleLinkError::Advertising(reason) => LinkError::adapter_unavailable(reason),
        }
    }
}

// ----------------------------------------------------------------------------
// btleplug Classification
// ----------------------------------------------------------------------------

/// Classify a btleplug failure during adapter bring-up, separating the two
/// cases the user can act on (radio off, permission) from the rest.
pub(crate) fn classify_adapter_error(err: btleplug::Error) -> BleLinkError {
    match err {
        btleplug::Error::PermissionDenied => BleLinkError::PermissionDenied,
        other => BleLinkError::NoAdapter(other.to_string()),
    }
}

/// Classify a btleplug failure during a connect attempt
pub(crate) fn classify_connect_error(peer: &str, err: btleplug::Error) -> BleLinkError {
    match err {
        btleplug::Error::PermissionDenied => BleLinkError::PermissionDenied,
        btleplug::Error::TimedOut(duration) => BleLinkError::ConnectTimeout(duration),
        other => BleLinkError::Connect {
            peer: peer.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radio_and_permission_failures_stay_distinct() {
        let off: LinkError = BleLinkError::PoweredOff.into();
        let denied: LinkError = BleLinkError::PermissionDenied.into();
        assert!(matches!(off, LinkError::PoweredOff));
        assert!(matches!(denied, LinkError::PermissionDenied { .. }));
        assert_ne!(off.to_string(), denied.to_string());
    }

    #[test]
    fn permission_errors_survive_classification() {
        let err = classify_adapter_error(btleplug::Error::PermissionDenied);
        assert!(matches!(err, BleLinkError::PermissionDenied));
        let err = classify_connect_error("peer", btleplug::Error::PermissionDenied);
        assert!(matches!(err, BleLinkError::PermissionDenied));
    }
}
