//! Type-safe decoder for the Assetto Corsa server plugin (ACSP) UDP protocol.
//!
//! The server plugin interface sends one UDP datagram per event: session
//! changes, driver connects and disconnects, completed laps, leaderboard deltas
//! and realtime car positions. The protocol is undocumented and server builds
//! disagree on string encodings and field widths, so the decoder is defensive:
//! every datagram becomes exactly one [`DecodeOutcome`] and a bad packet never
//! stops the receive loop.
//!
//! # Layers
//!
//! - [`protocol`]: bounds-checked [`PacketReader`], the string encoding
//!   heuristic, per-type decoders and outbound [`Command`]s
//! - [`Dispatcher`]: applies decoded packets to [`SessionState`] and
//!   [`DriverRegistry`] and emits enriched [`Event`]s
//! - [`Connection`]: async streams over a driver task fed by a
//!   [`Transport`](transport::Transport) (UDP socket or replay)
//!
//! ## Example (synchronous dispatch)
//!
//! ```rust
//! use acsp::{DecodeOutcome, Dispatcher, Event, RawPacket};
//!
//! let mut dispatcher = Dispatcher::new();
//! let source = "127.0.0.1:11000".parse().unwrap();
//!
//! let lap: [u8; 7] = [58, 4, 0x68, 0x50, 0x01, 0x00, 0];
//! match dispatcher.dispatch(&RawPacket::new(&lap[..], source)) {
//!     DecodeOutcome::Event(Event::LapCompleted(lap)) => {
//!         assert_eq!(lap.lap_time.to_string(), "1:26.120");
//!         assert!(lap.driver.is_none());
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Example (UDP listener)
//!
//! ```rust,no_run
//! use acsp::{Acsp, Event, ListenerConfig};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> acsp::Result<()> {
//!     let config = ListenerConfig::default().with_env_overrides()?;
//!     let connection = Acsp::listen(&config).await?;
//!     let mut events = Box::pin(connection.events());
//!
//!     while let Some(event) = events.next().await {
//!         if let Event::LapCompleted(lap) = event {
//!             println!("car {} lap {}", lap.car_id, lap.lap_time);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
pub mod protocol;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Decoding and state
pub mod dispatcher;
pub mod sink;
pub mod state;

// Stream-based runtime
pub mod config;
pub mod connection;
pub mod driver;
pub mod stream;
pub mod transport;
pub mod transports;

// Core exports
pub use error::*;
pub use types::*;

pub use config::ListenerConfig;
pub use connection::Connection;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use driver::DriverOptions;
pub use protocol::{Command, PacketReader, PacketType};
pub use sink::{LoggingSink, Sink};
pub use state::{DriverRegistry, SessionState};

use tracing::info;

use crate::transports::{ReplayTransport, UdpTransport};

/// Unified entry point for ACSP connections.
///
/// # Examples
///
/// ## Live server
/// ```rust,no_run
/// use acsp::{Acsp, ListenerConfig};
///
/// #[tokio::main]
/// async fn main() -> acsp::Result<()> {
///     let config = ListenerConfig::from_yaml_str("server: 127.0.0.1:11000")?;
///     let connection = Acsp::listen(&config).await?;
///     // Use connection...
///     Ok(())
/// }
/// ```
///
/// ## Captured datagrams
/// ```rust
/// use acsp::Acsp;
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let connection = Acsp::replay([vec![52u8, 4], vec![99]]).await;
/// let outcomes: Vec<_> = connection.outcomes().collect().await;
/// assert_eq!(outcomes.len(), 2);
/// # }
/// ```
pub struct Acsp;

impl Acsp {
    /// Bind a UDP socket and start decoding.
    ///
    /// Subscription requests from `config` are sent to `config.server` as soon
    /// as the driver starts.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the socket cannot
    /// be bound.
    pub async fn listen(config: &ListenerConfig) -> Result<Connection> {
        config.validate()?;
        let transport = UdpTransport::bind(config.bind).await?;
        let source_hz = config.realtime_interval_ms.map_or(0.0, |ms| 1000.0 / f64::from(ms.max(1)));

        info!(bind = %config.bind, server = ?config.server, "ACSP connection established");
        Ok(Connection::spawn(transport, DriverOptions::from(config)).with_source_hz(source_hz))
    }

    /// Decode a captured sequence of datagrams as fast as possible.
    pub async fn replay<I, D>(datagrams: I) -> Connection
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Connection::spawn(ReplayTransport::new(datagrams), DriverOptions::default())
    }
}
