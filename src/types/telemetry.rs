//! Realtime car telemetry projection

use serde::{Deserialize, Serialize};

/// m/s to km/h
const MS_TO_KMH: f32 = 3.6;

/// Position and velocity of one car, derived from a single realtime packet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetrySample {
    pub car_id: u8,
    pub protocol_version: u8,
    /// World position in metres (x, y, z)
    pub position: [f32; 3],
    /// Velocity in m/s (x, y, z)
    pub velocity: [f32; 3],
    pub distance_m: f32,
}

impl TelemetrySample {
    /// Scalar speed in m/s.
    pub fn speed_ms(&self) -> f32 {
        let [vx, vy, vz] = self.velocity;
        (vx * vx + vy * vy + vz * vz).sqrt()
    }

    /// Scalar speed in km/h.
    pub fn speed_kmh(&self) -> f32 {
        self.speed_ms() * MS_TO_KMH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(velocity: [f32; 3]) -> TelemetrySample {
        TelemetrySample {
            car_id: 4,
            protocol_version: 4,
            position: [0.0; 3],
            velocity,
            distance_m: 0.0,
        }
    }

    #[test]
    fn speed_from_velocity_components() {
        let sample = sample([3.0, 0.0, 4.0]);
        assert!((sample.speed_ms() - 5.0).abs() < f32::EPSILON);
        assert!((sample.speed_kmh() - 18.0).abs() < 1e-4);
    }

    #[test]
    fn stationary_car_has_zero_speed() {
        assert_eq!(sample([0.0; 3]).speed_kmh(), 0.0);
    }

    proptest! {
        #[test]
        fn speed_is_never_negative(
            vx in -100.0f32..100.0,
            vy in -100.0f32..100.0,
            vz in -100.0f32..100.0,
        ) {
            prop_assert!(sample([vx, vy, vz]).speed_kmh() >= 0.0);
        }
    }
}
