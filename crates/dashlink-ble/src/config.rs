//! BLE transport configuration

use std::time::Duration;

use crate::protocol::{DEVICE_NAME, DEVICE_NAME_PREFIX};

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Configuration for the BLE link
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BleLinkConfig {
    /// Scanning auto-stops after this long if not stopped explicitly
    pub scan_timeout: Duration,
    /// Maximum time to wait for the platform connect
    pub connection_timeout: Duration,
    /// Substring an advertised name must contain during discovery
    pub device_name_prefix: String,
    /// Local name advertised when acting as the sender peripheral
    pub local_name: String,
}

impl Default for BleLinkConfig {
    fn default() -> Self {
        Self {
            scan_timeout: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
            device_name_prefix: DEVICE_NAME_PREFIX.to_string(),
            local_name: DEVICE_NAME.to_string(),
        }
    }
}

impl BleLinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan auto-stop timeout
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    /// Set the connect timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the discovery name prefix
    pub fn with_device_name_prefix(mut self, prefix: String) -> Self {
        self.device_name_prefix = prefix;
        self
    }

    /// Set the advertised local name
    pub fn with_local_name(mut self, name: String) -> Self {
        self.local_name = name;
        self
    }
}
