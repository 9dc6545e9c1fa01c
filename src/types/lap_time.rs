//! Lap time representation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lap time in milliseconds, displayed as `M:SS.mmm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
#[serde(transparent)]
pub struct LapTime(u32);

impl LapTime {
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u32 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_millis(u64::from(self.0))
    }
}

impl From<u32> for LapTime {
    fn from(millis: u32) -> Self {
        Self(millis)
    }
}

impl fmt::Display for LapTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.0 / 60_000;
        let seconds = (self.0 % 60_000) / 1_000;
        let millis = self.0 % 1_000;
        write!(f, "{minutes}:{seconds:02}.{millis:03}")
    }
}
