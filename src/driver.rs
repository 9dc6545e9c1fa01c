//! Driver spawns and manages the datagram processing task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{DEFAULT_EVENT_CAPACITY, ListenerConfig};
use crate::dispatcher::{DispatchStats, Dispatcher};
use crate::protocol::Command;
use crate::transport::Transport;
use crate::types::{DecodeOutcome, DriverInfo, Event, SessionInfo};
use crate::{AcspError, Result};

/// Consecutive transport errors tolerated before the task gives up.
const MAX_ERRORS: u32 = 10;

/// Queue depth for outbound command requests.
const COMMAND_CAPACITY: usize = 32;

/// What the driver task does besides decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverOptions {
    /// Destination for outbound commands; without it commands fail with
    /// [`AcspError::NoServerAddress`] and start-up requests are skipped.
    pub server: Option<SocketAddr>,
    /// Sent once when the task starts.
    pub startup: Vec<Command>,
    /// Re-send `startup` at this period.
    pub resubscribe: Option<Duration>,
    pub event_capacity: usize,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            server: None,
            startup: Vec::new(),
            resubscribe: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl From<&ListenerConfig> for DriverOptions {
    fn from(config: &ListenerConfig) -> Self {
        Self {
            server: config.server,
            startup: config.startup_commands(),
            resubscribe: config.resubscribe_interval(),
            event_capacity: config.event_capacity,
        }
    }
}

/// An outbound command with a slot for the send result.
#[derive(Debug)]
pub struct CommandRequest {
    pub command: Command,
    pub reply: oneshot::Sender<Result<()>>,
}

/// Result of spawning the driver task
pub struct DriverChannels {
    /// First receiver of the outcome broadcast; sees everything from the start.
    pub outcomes: broadcast::Receiver<Arc<DecodeOutcome>>,
    /// Current session snapshot; `None` until the first NEW_SESSION
    pub sessions: watch::Receiver<Option<Arc<SessionInfo>>>,
    /// Connected drivers ordered by car id
    pub drivers: watch::Receiver<Arc<Vec<DriverInfo>>>,
    pub stats: watch::Receiver<DispatchStats>,
    /// Outbound command queue
    pub commands: mpsc::Sender<CommandRequest>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

struct Publishers {
    outcomes: broadcast::Sender<Arc<DecodeOutcome>>,
    sessions: watch::Sender<Option<Arc<SessionInfo>>>,
    drivers: watch::Sender<Arc<Vec<DriverInfo>>>,
    stats: watch::Sender<DispatchStats>,
}

enum Step {
    Cancelled,
    Datagram(Result<Option<crate::types::RawPacket>>),
    Command(Option<CommandRequest>),
    Resubscribe,
}

/// Driver runs the single consumer that owns the [`Dispatcher`].
///
/// Every datagram is decoded and applied to completion before the next one is
/// received, so state changes happen in arrival order.
pub struct Driver;

impl Driver {
    /// Spawn the driver task for the given transport
    pub fn spawn<T>(transport: T, options: DriverOptions) -> DriverChannels
    where
        T: Transport,
    {
        let (outcome_tx, outcome_rx) = broadcast::channel(options.event_capacity.max(1));
        let (session_tx, session_rx) = watch::channel(None);
        let (drivers_tx, drivers_rx) = watch::channel(Arc::new(Vec::new()));
        let (stats_tx, stats_rx) = watch::channel(DispatchStats::default());
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let cancel = CancellationToken::new();

        let publishers = Publishers {
            outcomes: outcome_tx,
            sessions: session_tx,
            drivers: drivers_tx,
            stats: stats_tx,
        };
        let cancel_task = cancel.clone();
        tokio::spawn(async move {
            Self::datagram_task(transport, options, publishers, command_rx, cancel_task).await;
        });

        DriverChannels {
            outcomes: outcome_rx,
            sessions: session_rx,
            drivers: drivers_rx,
            stats: stats_rx,
            commands: command_tx,
            cancel,
        }
    }

    async fn datagram_task<T>(
        mut transport: T,
        options: DriverOptions,
        publishers: Publishers,
        mut commands: mpsc::Receiver<CommandRequest>,
        cancel: CancellationToken,
    ) where
        T: Transport,
    {
        info!(server = ?options.server, "Datagram task started");
        let mut dispatcher = Dispatcher::new();
        let mut error_count = 0u32;
        let mut commands_open = true;
        let mut resubscribe = options.resubscribe.map(|period| {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks
        });

        Self::send_startup(&mut transport, &options).await;

        loop {
            let step = tokio::select! {
                biased;
                _ = cancel.cancelled() => Step::Cancelled,
                request = commands.recv(), if commands_open => Step::Command(request),
                _ = next_tick(&mut resubscribe) => Step::Resubscribe,
                result = transport.recv() => Step::Datagram(result),
            };

            match step {
                Step::Cancelled => {
                    info!("Datagram task cancelled");
                    break;
                }
                Step::Command(Some(request)) => {
                    let result = send_command(&mut transport, options.server, &request.command).await;
                    if let Err(e) = &result {
                        warn!(tag = request.command.tag(), "Command not sent: {}", e);
                    }
                    let _ = request.reply.send(result);
                }
                Step::Command(None) => {
                    debug!("Command channel closed");
                    commands_open = false;
                }
                Step::Resubscribe => {
                    debug!("Re-sending subscription requests");
                    Self::send_startup(&mut transport, &options).await;
                }
                Step::Datagram(Ok(Some(raw))) => {
                    error_count = 0;
                    let outcome = dispatcher.dispatch(&raw);
                    publishers.publish(&dispatcher, outcome);
                }
                Step::Datagram(Ok(None)) => {
                    info!("Transport ended");
                    break;
                }
                Step::Datagram(Err(e)) => {
                    // Transport error - don't crash on transient failures
                    error_count += 1;
                    error!("Transport error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS || !e.is_retryable() {
                        error!("Too many transport errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        let stats = dispatcher.stats();
        info!(
            events = stats.events,
            malformed = stats.malformed,
            unknown = stats.unknown,
            "Datagram task ended"
        );
    }

    async fn send_startup<T: Transport>(transport: &mut T, options: &DriverOptions) {
        if options.startup.is_empty() {
            return;
        }
        let Some(server) = options.server else {
            debug!("No server address, skipping subscription requests");
            return;
        };
        for command in &options.startup {
            if let Err(e) = send_command(transport, Some(server), command).await {
                warn!(tag = command.tag(), "Subscription request failed: {}", e);
            }
        }
    }
}

impl Publishers {
    fn publish(&self, dispatcher: &Dispatcher, outcome: DecodeOutcome) {
        if let DecodeOutcome::Event(event) = &outcome {
            if matches!(event, Event::SessionChanged { .. }) && dispatcher.session_known() {
                self.sessions.send_replace(Some(Arc::new(dispatcher.session().clone())));
            }
            if roster_changed(event) {
                self.drivers.send_replace(Arc::new(dispatcher.drivers().snapshot()));
            }
        }
        self.stats.send_replace(dispatcher.stats());

        // No subscribers is fine; the outcome is simply dropped.
        if self.outcomes.send(Arc::new(outcome)).is_err() {
            trace!("No outcome subscribers");
        }
    }
}

fn roster_changed(event: &Event) -> bool {
    match event {
        Event::DriverConnected { .. } | Event::DriverDisconnected { .. } => true,
        Event::LapCompleted(lap) => lap.personal_best,
        Event::LeaderboardUpdated(update) => !update.improved.is_empty(),
        Event::SessionChanged { .. } | Event::Telemetry(_) => false,
    }
}

async fn send_command<T: Transport>(
    transport: &mut T,
    server: Option<SocketAddr>,
    command: &Command,
) -> Result<()> {
    let server = server.ok_or(AcspError::NoServerAddress)?;
    debug!(tag = command.tag(), %server, "Sending command");
    transport.send(&command.encode(), server).await
}

/// Resolves on the next tick, or never when there is no interval.
async fn next_tick(ticks: &mut Option<Interval>) {
    match ticks {
        Some(ticks) => {
            ticks.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
