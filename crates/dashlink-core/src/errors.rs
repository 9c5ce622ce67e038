//! Error types for the dashlink link layer
//!
//! One taxonomy shared by both transports. Radio and permission failures are
//! distinct variants so the UI can tell the user to turn bluetooth on versus
//! grant a permission. Decode failures never appear here at all: malformed
//! frames are dropped and counted at the session, not surfaced to callers.

use thiserror::Error;

// ----------------------------------------------------------------------------
// Link Errors
// ----------------------------------------------------------------------------

/// Errors surfaced by the link layer
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no usable adapter: {reason}")]
    AdapterUnavailable { reason: String },

    #[error("bluetooth is powered off")]
    PoweredOff,

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("failed to start scanning: {reason}")]
    ScanFailed { reason: String },

    #[error("this transport has no broadcast discovery")]
    DiscoveryUnsupported,

    #[error("failed to start listener: {reason}")]
    ListenFailed { reason: String },

    #[error("connection to {peer} failed: {reason}")]
    ConnectFailed { peer: String, reason: String },

    #[error("connect timed out after {duration_ms}ms")]
    ConnectTimeout { duration_ms: u64 },

    #[error("a connect attempt is already in progress")]
    ConnectInProgress,

    #[error("a link is already established")]
    AlreadyConnected,

    #[error("service discovery failed: {reason}")]
    ServiceDiscoveryFailed { reason: String },

    #[error("characteristic not found: {characteristic}")]
    CharacteristicNotFound { characteristic: String },

    #[error("failed to subscribe to notifications: {reason}")]
    SubscribeFailed { reason: String },

    #[error("link is not connected")]
    NotConnected,

    #[error("write failed: {reason}")]
    WriteFailed { reason: String },

    #[error("failed to encode sample: {reason}")]
    EncodeFailed { reason: String },

    #[error("sensor sample contains non-finite values")]
    NonFiniteSample,

    #[error("invalid link state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl LinkError {
    /// Create an adapter-unavailable error
    pub fn adapter_unavailable<R: Into<String>>(reason: R) -> Self {
        LinkError::AdapterUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a permission-denied error
    pub fn permission_denied<R: Into<String>>(reason: R) -> Self {
        LinkError::PermissionDenied {
            reason: reason.into(),
        }
    }

    /// Create a scan-failed error
    pub fn scan_failed<R: Into<String>>(reason: R) -> Self {
        LinkError::ScanFailed {
            reason: reason.into(),
        }
    }

    /// Create a connection-failed error
    pub fn connect_failed<P: Into<String>, R: Into<String>>(peer: P, reason: R) -> Self {
        LinkError::ConnectFailed {
            peer: peer.into(),
            reason: reason.into(),
        }
    }

    /// Create a write-failed error
    pub fn write_failed<R: Into<String>>(reason: R) -> Self {
        LinkError::WriteFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid-state error
    pub fn invalid_state<E: Into<String>, A: Into<String>>(expected: E, actual: A) -> Self {
        LinkError::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = std::result::Result<T, LinkError>;
