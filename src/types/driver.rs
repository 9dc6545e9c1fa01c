//! Connected driver record

use serde::{Deserialize, Serialize};

use super::LapTime;

/// A connected driver, keyed by `car_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DriverInfo {
    pub car_id: u8,
    pub name: String,
    /// Platform identifier (Steam ID on most servers)
    pub guid: String,
    pub model: String,
    pub skin: String,
    /// Best valid lap seen this connection; only ever decreases once set.
    pub best_lap_millis: Option<u32>,
}

impl DriverInfo {
    /// A freshly connected driver with no lap recorded yet.
    pub fn new(
        car_id: u8,
        name: impl Into<String>,
        guid: impl Into<String>,
        model: impl Into<String>,
        skin: impl Into<String>,
    ) -> Self {
        Self {
            car_id,
            name: name.into(),
            guid: guid.into(),
            model: model.into(),
            skin: skin.into(),
            best_lap_millis: None,
        }
    }

    pub fn best_lap(&self) -> Option<LapTime> {
        self.best_lap_millis.map(LapTime::from_millis)
    }
}
