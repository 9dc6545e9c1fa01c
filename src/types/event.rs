//! Events emitted per processed datagram

use serde::{Deserialize, Serialize};

use super::{DriverInfo, LapTime, RawPacket, SessionInfo, TelemetrySample};
use crate::error::DecodeError;

/// One car's best time from a leaderboard packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LeaderboardEntry {
    pub car_id: u8,
    pub best_time_millis: u32,
}

/// Standings row appended to LAP_COMPLETED by some server builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct StandingEntry {
    pub car_id: u8,
    pub time_millis: u32,
    pub laps: u16,
    pub completed: bool,
}

/// A completed lap, enriched with the driver record when the car is known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapCompleted {
    pub car_id: u8,
    pub lap_time: LapTime,
    pub cuts: u8,
    /// Driver record after the lap was applied; `None` for unknown cars.
    pub driver: Option<DriverInfo>,
    /// Whether this lap set a new best for the driver.
    pub personal_best: bool,
    pub standings: Vec<StandingEntry>,
    pub grip_level: Option<f32>,
}

impl LapCompleted {
    /// A lap with no track-limit violations.
    pub fn is_valid(&self) -> bool {
        self.cuts == 0
    }
}

/// A batch of best-lap deltas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardUpdate {
    pub protocol_version: u8,
    pub session_time_millis: u32,
    /// Entries that passed range checks.
    pub entries: Vec<LeaderboardEntry>,
    /// Cars whose best lap improved because of this packet.
    pub improved: Vec<u8>,
    /// Entries discarded as out of range.
    pub rejected: Vec<DecodeError>,
}

/// A successfully decoded and applied packet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionChanged {
        session: SessionInfo,
        previous: SessionInfo,
    },
    DriverConnected {
        driver: DriverInfo,
        /// Record that previously held this car id, if any.
        replaced: Option<DriverInfo>,
    },
    DriverDisconnected {
        car_id: u8,
        name: Option<String>,
        /// Record removed from the registry, if the car was known.
        driver: Option<DriverInfo>,
    },
    LapCompleted(LapCompleted),
    LeaderboardUpdated(LeaderboardUpdate),
    Telemetry(TelemetrySample),
}

impl Event {
    /// Car the event refers to, when it refers to exactly one.
    pub fn car_id(&self) -> Option<u8> {
        match self {
            Event::SessionChanged { .. } | Event::LeaderboardUpdated(_) => None,
            Event::DriverConnected { driver, .. } => Some(driver.car_id),
            Event::DriverDisconnected { car_id, .. } => Some(*car_id),
            Event::LapCompleted(lap) => Some(lap.car_id),
            Event::Telemetry(sample) => Some(sample.car_id),
        }
    }
}

/// Result of processing exactly one datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Event(Event),
    MalformedPacket { raw: RawPacket, reason: DecodeError },
    UnknownType { tag: u8 },
}

impl DecodeOutcome {
    pub fn event(&self) -> Option<&Event> {
        match self {
            DecodeOutcome::Event(event) => Some(event),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, DecodeOutcome::MalformedPacket { .. })
    }
}
