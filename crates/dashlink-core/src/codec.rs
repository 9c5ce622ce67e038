//! Payload codec for sensor samples
//!
//! The wire frame is one compact JSON object per sample. The WiFi transport
//! sends that text directly as a WebSocket frame; the BLE transport wraps it
//! in standard base64 because the characteristic carries an opaque byte
//! payload.
//!
//! Decoding never propagates an error: a corrupt frame must not be able to
//! take down the receiver's read loop, so every decode path returns `None`
//! on malformed input and leaves a debug log behind.

use base64::{engine::general_purpose, Engine as _};
use tracing::debug;

use crate::errors::{LinkError, Result};
use crate::types::SensorSample;

// ----------------------------------------------------------------------------
// JSON frame (WiFi)
// ----------------------------------------------------------------------------

/// Encode a sample as one JSON text frame.
///
/// Fails on non-finite fields: NaN has no JSON representation and must
/// never reach the wire.
pub fn encode_frame(sample: &SensorSample) -> Result<String> {
    if !sample.is_finite() {
        return Err(LinkError::NonFiniteSample);
    }
    serde_json::to_string(sample).map_err(|e| LinkError::EncodeFailed {
        reason: e.to_string(),
    })
}

/// Decode one JSON text frame; `None` on any malformed input.
pub fn decode_frame(text: &str) -> Option<SensorSample> {
    match serde_json::from_str::<SensorSample>(text) {
        Ok(sample) if sample.is_finite() => Some(sample),
        Ok(_) => {
            debug!("dropping frame with non-finite fields");
            None
        }
        Err(e) => {
            debug!("dropping malformed frame: {e}");
            None
        }
    }
}

// ----------------------------------------------------------------------------
// Base64 payload (BLE)
// ----------------------------------------------------------------------------

/// Encode a sample for a characteristic write: JSON, then standard base64.
pub fn encode_ble(sample: &SensorSample) -> Result<String> {
    let json = encode_frame(sample)?;
    Ok(general_purpose::STANDARD.encode(json.as_bytes()))
}

/// Decode a characteristic value: base64 text bytes back to a sample.
///
/// `None` at every failure point: invalid UTF-8, invalid base64, or a
/// malformed inner frame.
pub fn decode_ble(value: &[u8]) -> Option<SensorSample> {
    let text = match core::str::from_utf8(value) {
        Ok(text) => text,
        Err(_) => {
            debug!("dropping characteristic value with invalid utf-8");
            return None;
        }
    };
    let raw = match general_purpose::STANDARD.decode(text.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("dropping characteristic value with invalid base64: {e}");
            return None;
        }
    };
    match String::from_utf8(raw) {
        Ok(json) => decode_frame(&json),
        Err(_) => {
            debug!("dropping characteristic payload with invalid utf-8");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_all_fields() {
        let sample = SensorSample::new(12.0, -3.0).with_altitude(500.0).with_speed(40.0);
        let text = encode_frame(&sample).unwrap();
        assert_eq!(decode_frame(&text), Some(sample));
    }

    #[test]
    fn frame_round_trips_without_optional_fields() {
        let sample = SensorSample::new(-89.25, 0.5);
        let text = encode_frame(&sample).unwrap();
        assert!(!text.contains("altitude"));
        assert!(!text.contains("speed"));
        assert_eq!(decode_frame(&text), Some(sample));
    }

    #[test]
    fn frame_matches_wire_shape() {
        let text = encode_frame(&SensorSample::new(12.0, -3.0).with_altitude(500.0).with_speed(40.0))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["pitch"], 12.0);
        assert_eq!(value["roll"], -3.0);
        assert_eq!(value["altitude"], 500.0);
        assert_eq!(value["speed"], 40.0);
    }

    #[test]
    fn encode_rejects_non_finite_fields() {
        assert!(matches!(
            encode_frame(&SensorSample::new(f64::NAN, 0.0)),
            Err(LinkError::NonFiniteSample)
        ));
        assert!(matches!(
            encode_frame(&SensorSample::new(0.0, 0.0).with_speed(f64::INFINITY)),
            Err(LinkError::NonFiniteSample)
        ));
    }

    #[test]
    fn decode_survives_garbage() {
        assert_eq!(decode_frame(""), None);
        assert_eq!(decode_frame("not json"), None);
        assert_eq!(decode_frame("{\"pitch\":1.0"), None);
        assert_eq!(decode_frame("{\"roll\":2.0}"), None);
        assert_eq!(decode_frame("[1,2,3]"), None);
    }

    #[test]
    fn ble_payload_round_trips() {
        let sample = SensorSample::new(1.5, -2.5).with_altitude(120.0);
        let payload = encode_ble(&sample).unwrap();
        assert_eq!(decode_ble(payload.as_bytes()), Some(sample));
    }

    #[test]
    fn ble_decode_survives_garbage() {
        assert_eq!(decode_ble(b""), None);
        assert_eq!(decode_ble(b"@@not-base64@@"), None);
        assert_eq!(decode_ble(&[0xff, 0xfe, 0x00]), None);
        // valid base64 of a non-JSON string
        let payload = general_purpose::STANDARD.encode(b"hello");
        assert_eq!(decode_ble(payload.as_bytes()), None);
    }
}
