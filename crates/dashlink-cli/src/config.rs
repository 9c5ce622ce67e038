//! Layered configuration for the dashlink CLI
//!
//! Priority ordering: CLI arguments > `DASHLINK_*` environment variables >
//! TOML configuration file > built-in defaults.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use dashlink_ble::BleLinkConfig;
use dashlink_wifi::WifiLinkConfig;

use crate::error::Result;

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the CLI application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// BLE transport configuration
    pub ble: BleLinkConfig,

    /// WiFi transport configuration
    pub wifi: WifiLinkConfig,

    /// Demo sender configuration
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ble: BleLinkConfig::default(),
            wifi: WifiLinkConfig::default(),
            demo: DemoConfig::default(),
        }
    }
}

/// Settings for the synthetic sample stream the demo sender produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Milliseconds between samples
    pub interval_ms: u64,

    /// Baseline altitude reported by the synthetic GPS, in meters
    pub base_altitude: f64,

    /// Baseline speed reported by the synthetic GPS, in m/s
    pub base_speed_mps: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            base_altitude: 650.0,
            base_speed_mps: 12.0,
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the optional TOML file, then
    /// `DASHLINK_*` environment variables.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("DASHLINK_").split("__"))
            .extract()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_published_protocol() {
        let config = AppConfig::default();
        assert_eq!(config.wifi.port, 8765);
        assert_eq!(config.ble.device_name_prefix, "CarDashboard");
        assert_eq!(config.demo.interval_ms, 200);
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.wifi.port, AppConfig::default().wifi.port);
    }
}
