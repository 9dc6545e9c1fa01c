//! Connected drivers keyed by car id

use std::collections::HashMap;

use crate::types::DriverInfo;

/// Map of `car_id` to [`DriverInfo`].
#[derive(Debug, Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<u8, DriverInfo>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `driver` under `car_id`, replacing any previous record wholesale.
    ///
    /// The stored record's `car_id` is forced to the key.
    pub fn upsert(&mut self, car_id: u8, mut driver: DriverInfo) -> Option<DriverInfo> {
        driver.car_id = car_id;
        self.drivers.insert(car_id, driver)
    }

    /// Remove a driver. Unknown ids are a no-op.
    pub fn remove(&mut self, car_id: u8) -> Option<DriverInfo> {
        self.drivers.remove(&car_id)
    }

    pub fn get(&self, car_id: u8) -> Option<&DriverInfo> {
        self.drivers.get(&car_id)
    }

    pub fn contains(&self, car_id: u8) -> bool {
        self.drivers.contains_key(&car_id)
    }

    /// Apply a lap to the driver's best time.
    ///
    /// Only clean laps (`cuts == 0`) strictly faster than the current best are
    /// recorded. Returns whether a new best was set; unknown cars return
    /// `false`.
    pub fn record_lap(&mut self, car_id: u8, lap_time_millis: u32, cuts: u8) -> bool {
        if cuts != 0 {
            return false;
        }
        self.apply_best(car_id, lap_time_millis)
    }

    /// Monotonic-minimum update shared by laps and leaderboard entries.
    pub(crate) fn apply_best(&mut self, car_id: u8, time_millis: u32) -> bool {
        let Some(driver) = self.drivers.get_mut(&car_id) else {
            return false;
        };
        match driver.best_lap_millis {
            Some(best) if time_millis >= best => false,
            _ => {
                driver.best_lap_millis = Some(time_millis);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DriverInfo> {
        self.drivers.values()
    }

    /// Owned copy of every record, ordered by car id.
    pub fn snapshot(&self) -> Vec<DriverInfo> {
        let mut drivers: Vec<_> = self.drivers.values().cloned().collect();
        drivers.sort_by_key(|driver| driver.car_id);
        drivers
    }
}
