//! Connection handle over a running driver task.
//!
//! A [`Connection`] is what [`Acsp::listen`](crate::Acsp::listen) and
//! [`Acsp::replay`](crate::Acsp::replay) return. It exposes the driver's
//! channels as streams and snapshots, and cancels the driver when dropped.

use futures::{Stream, StreamExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatcher::DispatchStats;
use crate::driver::{CommandRequest, Driver, DriverOptions};
use crate::protocol::Command;
use crate::stream::ThrottleExt;
use crate::transport::Transport;
use crate::types::{DecodeOutcome, DriverInfo, Event, SessionInfo, TelemetrySample, UpdateRate};
use crate::{AcspError, Result};

#[cfg(test)]
mod tests;

/// Live view of an ACSP datagram source.
pub struct Connection {
    /// Receiver created before the driver started; handed to the first subscriber.
    first_outcomes: Mutex<Option<broadcast::Receiver<Arc<DecodeOutcome>>>>,

    /// Template for later subscribers.
    outcomes: broadcast::Receiver<Arc<DecodeOutcome>>,

    sessions: watch::Receiver<Option<Arc<SessionInfo>>>,
    drivers: watch::Receiver<Arc<Vec<DriverInfo>>>,
    stats: watch::Receiver<DispatchStats>,
    commands: mpsc::Sender<CommandRequest>,

    /// Server realtime frequency, zero when unknown
    source_hz: f64,

    local_addr: Option<std::net::SocketAddr>,

    /// Cancellation token for stopping tasks
    cancel: CancellationToken,
}

impl Connection {
    /// Spawn a driver over `transport` and wrap its channels.
    pub fn spawn<T: Transport>(transport: T, options: DriverOptions) -> Self {
        let local_addr = transport.local_addr();
        let channels = Driver::spawn(transport, options);
        let outcomes = channels.outcomes.resubscribe();

        Self {
            first_outcomes: Mutex::new(Some(channels.outcomes)),
            outcomes,
            sessions: channels.sessions,
            drivers: channels.drivers,
            stats: channels.stats,
            commands: channels.commands,
            source_hz: 0.0,
            local_addr,
            cancel: channels.cancel,
        }
    }

    /// Declare the server's realtime update frequency, used to normalize
    /// [`UpdateRate`]s.
    pub fn with_source_hz(mut self, hz: f64) -> Self {
        self.source_hz = if hz.is_finite() && hz > 0.0 { hz } else { 0.0 };
        self
    }

    fn subscribe_outcomes(&self) -> broadcast::Receiver<Arc<DecodeOutcome>> {
        let first = self.first_outcomes.lock().ok().and_then(|mut slot| slot.take());
        first.unwrap_or_else(|| self.outcomes.resubscribe())
    }

    /// Every outcome, one per datagram, in arrival order.
    ///
    /// The first call sees outcomes from the moment the connection was
    /// created; later calls start at the next datagram. A subscriber that
    /// falls more than the configured capacity behind skips the missed
    /// outcomes. The stream ends when the driver stops.
    pub fn outcomes(&self) -> impl Stream<Item = Arc<DecodeOutcome>> + 'static {
        BroadcastStream::new(self.subscribe_outcomes()).filter_map(|item| async move {
            match item {
                Ok(outcome) => Some(outcome),
                Err(lagged) => {
                    warn!("Outcome subscriber fell behind: {}", lagged);
                    None
                }
            }
        })
    }

    /// Successfully applied events only.
    pub fn events(&self) -> impl Stream<Item = Event> + 'static {
        self.outcomes().filter_map(|outcome| async move { outcome.event().cloned() })
    }

    /// Realtime samples for one car.
    pub fn telemetry(&self, car_id: u8, rate: UpdateRate) -> impl Stream<Item = TelemetrySample> + 'static {
        let samples = self.outcomes().filter_map(move |outcome| async move {
            match outcome.event() {
                Some(Event::Telemetry(sample)) if sample.car_id == car_id => Some(*sample),
                _ => None,
            }
        });

        match rate.normalize(self.source_hz) {
            UpdateRate::Native => samples.boxed(),
            UpdateRate::Max(hz) => {
                let interval = Duration::from_secs_f64(1.0 / hz as f64);
                samples.throttle(interval).boxed()
            }
        }
    }

    /// Session snapshots, starting with the current one once it is known.
    pub fn session_updates(&self) -> impl Stream<Item = Arc<SessionInfo>> + 'static {
        WatchStream::new(self.sessions.clone()).filter_map(|session| async move { session })
    }

    /// Current session, or the unknown sentinel before the first NEW_SESSION.
    pub fn current_session(&self) -> Arc<SessionInfo> {
        self.sessions.borrow().clone().unwrap_or_else(|| Arc::new(SessionInfo::unknown()))
    }

    /// Whether a NEW_SESSION has been received yet.
    pub fn has_session(&self) -> bool {
        self.sessions.borrow().is_some()
    }

    pub fn driver(&self, car_id: u8) -> Option<DriverInfo> {
        self.drivers.borrow().iter().find(|driver| driver.car_id == car_id).cloned()
    }

    /// Connected drivers ordered by car id.
    pub fn drivers(&self) -> Arc<Vec<DriverInfo>> {
        self.drivers.borrow().clone()
    }

    pub fn stats(&self) -> DispatchStats {
        *self.stats.borrow()
    }

    /// Send a command to the server plugin.
    ///
    /// Resolves once the datagram has been handed to the transport.
    pub async fn send(&self, command: Command) -> Result<()> {
        let (reply, result) = oneshot::channel();
        self.commands
            .send(CommandRequest { command, reply })
            .await
            .map_err(|_| AcspError::ChannelClosed)?;
        result.await.map_err(|_| AcspError::ChannelClosed)?
    }

    /// Broadcast a chat message to every car.
    pub async fn broadcast_chat(&self, message: impl Into<String>) -> Result<()> {
        self.send(Command::BroadcastChat { message: message.into() }).await
    }

    /// Wait until the session is known, up to `timeout`.
    pub async fn wait_for_session(&self, timeout: Duration) -> Result<Arc<SessionInfo>> {
        let mut sessions = self.sessions.clone();
        let wait = async {
            loop {
                if let Some(current) = sessions.borrow_and_update().clone() {
                    return Ok(current);
                }
                if sessions.changed().await.is_err() {
                    return Err(AcspError::ChannelClosed);
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| AcspError::Timeout { duration: timeout })?
    }

    /// Get the server realtime frequency
    pub fn source_hz(&self) -> f64 {
        self.source_hz
    }

    /// Address the transport is bound to, if it has one.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.local_addr
    }

    /// Stop the driver task. Streams end once it exits.
    pub fn shutdown(&self) {
        info!("Shutting down connection");
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.commands.is_closed()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        debug!("Dropping connection");
        // Cancel tasks on drop for clean shutdown
        self.cancel.cancel();
    }
}
