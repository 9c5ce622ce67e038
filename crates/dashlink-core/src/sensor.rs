//! Attitude and motion math for raw sensor readings
//!
//! The sender computes pitch and roll from a raw accelerometer vector and
//! converts the GPS speed fix from m/s to km/h before building a
//! [`SensorSample`]. Receivers never touch this module; they display
//! whatever arrives.

use crate::types::SensorSample;

// ----------------------------------------------------------------------------
// Attitude
// ----------------------------------------------------------------------------

/// Pitch in degrees from a raw accelerometer vector.
pub fn pitch_degrees(x: f64, y: f64, z: f64) -> f64 {
    (-x).atan2((y * y + z * z).sqrt()).to_degrees()
}

/// Roll in degrees from a raw accelerometer vector.
pub fn roll_degrees(y: f64, z: f64) -> f64 {
    y.atan2(z).to_degrees()
}

/// Convert a GPS speed fix from m/s to km/h.
pub fn speed_kmh(meters_per_second: f64) -> f64 {
    meters_per_second * 3.6
}

/// Build a sample from a raw accelerometer vector.
pub fn sample_from_accel(x: f64, y: f64, z: f64) -> SensorSample {
    SensorSample::new(pitch_degrees(x, y, z), roll_degrees(y, z))
}

// ----------------------------------------------------------------------------
// Zero Calibration
// ----------------------------------------------------------------------------

/// Attitude offsets so the current mounting angle reads as level.
///
/// A dashboard-mounted phone rarely sits flat; the user zeroes the gauges
/// once and every subsequent reading is reported relative to that pose.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttitudeZero {
    pitch_offset: f64,
    roll_offset: f64,
}

impl AttitudeZero {
    /// Capture the current attitude as the new level reference.
    pub fn calibrate(&mut self, pitch: f64, roll: f64) {
        self.pitch_offset = pitch;
        self.roll_offset = roll;
    }

    /// Clear the reference back to true level.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply the reference to a raw attitude reading.
    pub fn apply(&self, pitch: f64, roll: f64) -> (f64, f64) {
        (pitch - self.pitch_offset, roll - self.roll_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn flat_device_reads_level() {
        // gravity straight through the z axis
        assert!(close(pitch_degrees(0.0, 0.0, 9.81), 0.0));
        assert!(close(roll_degrees(0.0, 9.81), 0.0));
    }

    #[test]
    fn nose_down_pitches_positive() {
        // gravity fully along -x: device pointing straight down
        assert!(close(pitch_degrees(-9.81, 0.0, 0.0), 90.0));
        assert!(close(pitch_degrees(9.81, 0.0, 0.0), -90.0));
    }

    #[test]
    fn on_its_side_rolls_ninety() {
        assert!(close(roll_degrees(9.81, 0.0), 90.0));
        assert!(close(roll_degrees(-9.81, 0.0), -90.0));
    }

    #[test]
    fn speed_conversion_matches_gps_fix() {
        assert!(close(speed_kmh(10.0), 36.0));
        assert!(close(speed_kmh(0.0), 0.0));
    }

    #[test]
    fn calibration_zeroes_mounting_angle() {
        let mut zero = AttitudeZero::default();
        zero.calibrate(12.0, -3.0);
        assert_eq!(zero.apply(12.0, -3.0), (0.0, 0.0));
        assert_eq!(zero.apply(14.0, -1.0), (2.0, 2.0));
        zero.reset();
        assert_eq!(zero.apply(14.0, -1.0), (14.0, -1.0));
    }
}
