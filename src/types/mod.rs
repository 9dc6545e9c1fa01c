//! Core types for decoded ACSP data.
//!
//! - [`RawPacket`] is one datagram as delivered by a transport
//! - [`SessionInfo`] and [`DriverInfo`] are the state snapshots kept by the dispatcher
//! - [`Event`] and [`DecodeOutcome`] describe what a datagram turned into
//! - [`TelemetrySample`] is the per-packet projection of realtime car updates
//! - [`LapTime`] renders millisecond lap times as `M:SS.mmm`
//! - [`UpdateRate`] controls throttling of telemetry streams
//!
//! ## Usage Example
//!
//! ```rust
//! use acsp::types::{DriverInfo, LapTime};
//!
//! let mut driver = DriverInfo::new(4, "Porx", "76561199230780195", "ks_toyota_ae86", "drift");
//! driver.best_lap_millis = Some(86_120);
//! assert_eq!(driver.best_lap().map(|t| t.to_string()), Some("1:26.120".to_string()));
//! assert_eq!(LapTime::from_millis(85_430).to_string(), "1:25.430");
//! ```

mod driver;
mod event;
mod lap_time;
mod packet;
mod session;
mod telemetry;
mod update_rate;

pub use driver::DriverInfo;
pub use event::{
    DecodeOutcome, Event, LapCompleted, LeaderboardEntry, LeaderboardUpdate, StandingEntry,
};
pub use lap_time::LapTime;
pub use packet::RawPacket;
pub use session::{SessionInfo, SessionKind, UNKNOWN};
pub use telemetry::TelemetrySample;
pub use update_rate::UpdateRate;
