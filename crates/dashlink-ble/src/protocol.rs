//! BLE protocol constants for the dashboard sensor service

use uuid::Uuid;

// ----------------------------------------------------------------------------
// Service and Characteristic UUIDs
// ----------------------------------------------------------------------------

/// Dashboard sensor GATT service
pub const SENSOR_SERVICE_UUID: Uuid = Uuid::from_u128(0x4fafc201_1fb5_459e_8fcc_c5c9c331914b);

/// Characteristic carrying the base64-encoded sensor frame
pub const SENSOR_DATA_CHARACTERISTIC_UUID: Uuid =
    Uuid::from_u128(0xbeb5483e_36e1_4688_b7f5_ea07361b26a8);

/// Advertised local name of a sender device
pub const DEVICE_NAME: &str = "CarDashboard_Sensor";

/// Substring an advertisement name must contain to be recognized
pub const DEVICE_NAME_PREFIX: &str = "CarDashboard";

/// Whether an advertised name identifies a dashboard peer
pub fn is_dashboard_name(name: &str, prefix: &str) -> bool {
    name.contains(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_dashboard_names() {
        assert!(is_dashboard_name(DEVICE_NAME, DEVICE_NAME_PREFIX));
        assert!(is_dashboard_name("CarDashboard_Monitor", DEVICE_NAME_PREFIX));
        assert!(!is_dashboard_name("SomeOtherDevice", DEVICE_NAME_PREFIX));
        assert!(!is_dashboard_name("", DEVICE_NAME_PREFIX));
    }

    #[test]
    fn uuids_match_the_published_service() {
        assert_eq!(
            SENSOR_SERVICE_UUID.to_string(),
            "4fafc201-1fb5-459e-8fcc-c5c9c331914b"
        );
        assert_eq!(
            SENSOR_DATA_CHARACTERISTIC_UUID.to_string(),
            "beb5483e-36e1-4688-b7f5-ea07361b26a8"
        );
    }
}
