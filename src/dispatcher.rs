//! Routes datagrams to decoders and applies the results to state.
//!
//! The [`Dispatcher`] owns the [`SessionState`] and [`DriverRegistry`]. Each
//! call to [`Dispatcher::dispatch`] turns exactly one datagram into exactly one
//! [`DecodeOutcome`]. State is touched only after the whole packet decoded, so
//! a malformed datagram never leaves a partial update behind.
//!
//! ```rust
//! use acsp::{DecodeOutcome, Dispatcher, RawPacket};
//!
//! let mut dispatcher = Dispatcher::new();
//! let source = "127.0.0.1:11000".parse().unwrap();
//!
//! let outcome = dispatcher.dispatch(&RawPacket::new(vec![58u8, 0x01], source));
//! assert!(outcome.is_malformed());
//! assert_eq!(dispatcher.stats().malformed, 1);
//! ```

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::protocol::{Decoded, LapPacket, LeaderboardPacket, Packet, decode};
use crate::sink::Sink;
use crate::state::{DriverRegistry, SessionState};
use crate::types::{
    DecodeOutcome, DriverInfo, Event, LapCompleted, LapTime, LeaderboardUpdate, RawPacket,
    SessionInfo,
};

/// Leaderboard times must fall strictly between zero and this bound to count.
const LEADERBOARD_TIME_LIMIT: u32 = i32::MAX as u32;

/// Running totals per outcome kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct DispatchStats {
    pub events: u64,
    pub malformed: u64,
    pub unknown: u64,
}

impl DispatchStats {
    pub fn total(&self) -> u64 {
        self.events + self.malformed + self.unknown
    }

    fn record(&mut self, outcome: &DecodeOutcome) {
        match outcome {
            DecodeOutcome::Event(_) => self.events += 1,
            DecodeOutcome::MalformedPacket { .. } => self.malformed += 1,
            DecodeOutcome::UnknownType { .. } => self.unknown += 1,
        }
    }
}

/// Single-consumer packet dispatcher.
#[derive(Debug, Default)]
pub struct Dispatcher {
    session: SessionState,
    drivers: DriverRegistry,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing state, e.g. a roster restored by the host.
    pub fn with_state(session: SessionState, drivers: DriverRegistry) -> Self {
        Self { session, drivers, stats: DispatchStats::default() }
    }

    /// Decode one datagram and apply it.
    pub fn dispatch(&mut self, raw: &RawPacket) -> DecodeOutcome {
        let outcome = match decode(&raw.data) {
            Ok(Decoded::Packet(packet)) => DecodeOutcome::Event(self.apply(packet)),
            Ok(Decoded::Unknown(tag)) => {
                trace!(tag, len = raw.len(), source = %raw.source, "Ignoring unknown packet type");
                DecodeOutcome::UnknownType { tag }
            }
            Err(reason) => {
                debug!(
                    tag = raw.tag(),
                    len = raw.len(),
                    source = %raw.source,
                    kind = reason.kind(),
                    "Malformed packet: {}",
                    reason
                );
                DecodeOutcome::MalformedPacket { raw: raw.clone(), reason }
            }
        };

        self.stats.record(&outcome);
        outcome
    }

    /// Dispatch and hand the outcome to `sink`.
    pub fn dispatch_to<S: Sink + ?Sized>(&mut self, raw: &RawPacket, sink: &mut S) {
        let outcome = self.dispatch(raw);
        sink.accept(&outcome);
    }

    pub fn session(&self) -> &SessionInfo {
        self.session.current()
    }

    /// Whether any NEW_SESSION has been applied yet.
    pub fn session_known(&self) -> bool {
        self.session.is_known()
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }

    pub fn driver(&self, car_id: u8) -> Option<&DriverInfo> {
        self.drivers.get(car_id)
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    fn apply(&mut self, packet: Packet) -> Event {
        match packet {
            Packet::NewSession(session) => {
                info!(
                    server = %session.server_name,
                    track = %session.track_label(),
                    session = %session.session_name,
                    "New session"
                );
                let previous = self.session.replace(session.clone());
                Event::SessionChanged { session, previous }
            }
            Packet::NewCarConnection { driver, flag } => {
                info!(car_id = driver.car_id, name = %driver.name, model = %driver.model, "Driver connected");
                trace!(car_id = driver.car_id, flag, "Connection flag");
                let replaced = self.drivers.upsert(driver.car_id, driver.clone());
                Event::DriverConnected { driver, replaced }
            }
            Packet::CarDisconnected { car_id, name } => {
                let driver = self.drivers.remove(car_id);
                let label = name.as_deref().or(driver.as_ref().map(|d| d.name.as_str()));
                info!(car_id, name = label.unwrap_or("?"), "Driver disconnected");
                Event::DriverDisconnected { car_id, name, driver }
            }
            Packet::LapCompleted(lap) => Event::LapCompleted(self.apply_lap(lap)),
            Packet::LeaderboardUpdate(board) => Event::LeaderboardUpdated(self.apply_leaderboard(board)),
            Packet::RealtimeCarUpdate(sample) => Event::Telemetry(sample),
        }
    }

    fn apply_lap(&mut self, lap: LapPacket) -> LapCompleted {
        let LapPacket { car_id, lap_time_millis, cuts, standings, grip_level } = lap;
        let personal_best = self.drivers.record_lap(car_id, lap_time_millis, cuts);
        let driver = self.drivers.get(car_id).cloned();
        let lap_time = LapTime::from_millis(lap_time_millis);

        if personal_best {
            info!(car_id, lap = %lap_time, "New personal best");
        } else {
            debug!(car_id, lap = %lap_time, cuts, known = driver.is_some(), "Lap completed");
        }

        LapCompleted { car_id, lap_time, cuts, driver, personal_best, standings, grip_level }
    }

    fn apply_leaderboard(&mut self, board: LeaderboardPacket) -> LeaderboardUpdate {
        let LeaderboardPacket { protocol_version, session_time_millis, entries, rejected } = board;

        for reason in &rejected {
            debug!(kind = reason.kind(), "Discarded leaderboard entry: {}", reason);
        }

        let mut improved = Vec::new();
        for entry in &entries {
            let time = entry.best_time_millis;
            if time == 0 || time >= LEADERBOARD_TIME_LIMIT {
                continue;
            }
            if self.drivers.apply_best(entry.car_id, time) && !improved.contains(&entry.car_id) {
                improved.push(entry.car_id);
            }
        }

        if !improved.is_empty() {
            info!(cars = ?improved, "Leaderboard improved best laps");
        }

        LeaderboardUpdate { protocol_version, session_time_millis, entries, improved, rejected }
    }
}
