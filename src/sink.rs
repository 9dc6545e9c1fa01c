//! Consumers of decode outcomes.
//!
//! A [`Sink`] receives one [`DecodeOutcome`] per processed datagram. Calls are
//! fire-and-forget: the dispatcher does not look at what the sink does with it.

use tracing::{debug, info, trace};

use crate::types::{DecodeOutcome, Event};

pub trait Sink {
    fn accept(&mut self, outcome: &DecodeOutcome);
}

impl<F> Sink for F
where
    F: FnMut(&DecodeOutcome),
{
    fn accept(&mut self, outcome: &DecodeOutcome) {
        self(outcome)
    }
}

/// Collects owned copies, mostly useful in tests.
impl Sink for Vec<DecodeOutcome> {
    fn accept(&mut self, outcome: &DecodeOutcome) {
        self.push(outcome.clone());
    }
}

/// Renders each outcome as a log line.
///
/// Events go out at `info`, telemetry at `trace`, diagnostics at `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl Sink for LoggingSink {
    fn accept(&mut self, outcome: &DecodeOutcome) {
        match outcome {
            DecodeOutcome::Event(event) => log_event(event),
            DecodeOutcome::MalformedPacket { raw, reason } => {
                debug!(source = %raw.source, len = raw.len(), "Malformed packet: {}", reason);
            }
            DecodeOutcome::UnknownType { tag } => debug!(tag, "Unknown packet type"),
        }
    }
}

fn log_event(event: &Event) {
    match event {
        Event::SessionChanged { session, .. } => info!(
            "Session: {} | {} | {}",
            session.server_name,
            session.track_label(),
            session.session_name
        ),
        Event::DriverConnected { driver, .. } => {
            info!("Car {} connected: {} ({})", driver.car_id, driver.name, driver.model)
        }
        Event::DriverDisconnected { car_id, name, driver } => {
            let name = name.as_deref().or(driver.as_ref().map(|d| d.name.as_str()));
            info!("Car {} disconnected: {}", car_id, name.unwrap_or("unknown driver"));
        }
        Event::LapCompleted(lap) => {
            let name = lap.driver.as_ref().map_or("unknown driver", |d| d.name.as_str());
            let verdict = match (lap.is_valid(), lap.personal_best) {
                (true, true) => "personal best",
                (true, false) => "valid",
                (false, _) => "invalid",
            };
            info!("Lap: car {} {} {} ({}, cuts {})", lap.car_id, name, lap.lap_time, verdict, lap.cuts);
        }
        Event::LeaderboardUpdated(update) => info!(
            "Leaderboard: {} entries, {} improved, {} rejected",
            update.entries.len(),
            update.improved.len(),
            update.rejected.len()
        ),
        Event::Telemetry(sample) => trace!(
            "Car {} at {:.1} km/h, {:.1} m",
            sample.car_id,
            sample.speed_kmh(),
            sample.distance_m
        ),
    }
}
