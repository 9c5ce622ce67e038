//! Error types for the WiFi transport

use std::time::Duration;

use dashlink_core::LinkError;
use thiserror::Error;

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

/// Errors specific to the WiFi transport
#[derive(Debug, Error)]
pub enum WifiLinkError {
    #[error("not a usable server address: {0}")]
    InvalidAddress(String),

    #[error("connect to {0} timed out after {1:?}")]
    ConnectTimeout(String, Duration),

    #[error("connection to {peer} failed: {reason}")]
    Connect { peer: String, reason: String },

    #[error("failed to bind listener on {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("socket write failed: {0}")]
    Write(String),
}

impl From<WifiLinkError> for LinkError {
    fn from(err: WifiLinkError) -> Self {
        match err {
            WifiLinkError::InvalidAddress(addr) => {
                LinkError::connect_failed(addr, "not a valid IP address")
            }
            WifiLinkError::ConnectTimeout(_, duration) => LinkError::ConnectTimeout {
                duration_ms: duration.as_millis() as u64,
            },
            WifiLinkError::Connect { peer, reason } => LinkError::connect_failed(peer, reason),
            WifiLinkError::Bind { addr, reason } => LinkError::ListenFailed {
                reason: format!("bind {addr}: {reason}"),
            },
            WifiLinkError::Write(reason) => LinkError::write_failed(reason),
        }
    }
}
