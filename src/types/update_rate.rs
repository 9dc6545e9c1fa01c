//! Update rate control for telemetry streams

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Update rate for telemetry streams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum UpdateRate {
    /// Every sample the server sends
    Native,

    /// Throttled to maximum Hz
    /// If the requested rate meets or exceeds the source rate, Native is used
    Max(u32),
}

impl UpdateRate {
    /// Normalize rate against the server's realtime frequency.
    ///
    /// A `source_hz` of zero means the frequency is unknown; `Max(0)` is
    /// treated as Native.
    pub fn normalize(self, source_hz: f64) -> Self {
        match self {
            UpdateRate::Native | UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if source_hz > 0.0 && hz as f64 >= source_hz => {
                UpdateRate::Native
            }
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// Get throttle interval if needed
    pub fn throttle_interval(self, source_hz: f64) -> Option<Duration> {
        match self.normalize(source_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_above_source_is_native() {
        assert_eq!(UpdateRate::Max(60).normalize(10.0), UpdateRate::Native);
        assert_eq!(UpdateRate::Max(5).normalize(10.0), UpdateRate::Max(5));
    }

    #[test]
    fn unknown_source_keeps_requested_rate() {
        assert_eq!(UpdateRate::Max(5).normalize(0.0), UpdateRate::Max(5));
        assert_eq!(UpdateRate::Max(0).normalize(0.0), UpdateRate::Native);
    }

    #[test]
    fn interval_matches_rate() {
        assert_eq!(UpdateRate::Native.throttle_interval(10.0), None);
        assert_eq!(UpdateRate::Max(4).throttle_interval(10.0), Some(Duration::from_millis(250)));
    }
}
