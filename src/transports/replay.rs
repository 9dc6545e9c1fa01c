//! In-memory transport for captured datagrams

use std::collections::VecDeque;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::transport::Transport;
use crate::types::RawPacket;
use crate::Result;

/// Source address stamped on datagrams that were given without one.
pub const REPLAY_SOURCE: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 11000);

/// An outbound datagram captured by [`ReplayTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDatagram {
    pub bytes: Vec<u8>,
    pub dest: SocketAddr,
}

/// Feeds a fixed list of datagrams, optionally paced, then ends.
///
/// Outbound datagrams are not sent anywhere; they are captured on a channel
/// available through [`ReplayTransport::take_outbox`].
pub struct ReplayTransport {
    queue: VecDeque<RawPacket>,
    pacing: Option<Interval>,
    delivered: usize,
    outbox_tx: mpsc::UnboundedSender<SentDatagram>,
    outbox_rx: Option<mpsc::UnboundedReceiver<SentDatagram>>,
}

impl ReplayTransport {
    /// Replay payloads as if they came from [`REPLAY_SOURCE`].
    pub fn new<I, D>(datagrams: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: AsRef<[u8]>,
    {
        Self::from_packets(
            datagrams.into_iter().map(|d| RawPacket::new(d.as_ref(), REPLAY_SOURCE)),
        )
    }

    pub fn from_packets(packets: impl IntoIterator<Item = RawPacket>) -> Self {
        let queue: VecDeque<_> = packets.into_iter().collect();
        debug!(datagrams = queue.len(), "Replay transport loaded");
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self { queue, pacing: None, delivered: 0, outbox_tx, outbox_rx: Some(outbox_rx) }
    }

    /// Deliver at most one datagram per `period`. A zero period disables pacing.
    pub fn with_pacing(mut self, period: Duration) -> Self {
        self.pacing = (!period.is_zero()).then(|| {
            let mut pacing = interval(period);
            pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
            pacing
        });
        self
    }

    /// Receiver for everything passed to `send`. Available once.
    pub fn take_outbox(&mut self) -> Option<mpsc::UnboundedReceiver<SentDatagram>> {
        self.outbox_rx.take()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait::async_trait]
impl Transport for ReplayTransport {
    async fn recv(&mut self) -> Result<Option<RawPacket>> {
        if self.queue.is_empty() {
            debug!(delivered = self.delivered, "Replay exhausted");
            return Ok(None);
        }

        if let Some(pacing) = self.pacing.as_mut() {
            pacing.tick().await;
        }

        let Some(packet) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.delivered += 1;
        trace!(index = self.delivered, len = packet.len(), "Replaying datagram");
        Ok(Some(packet))
    }

    async fn send(&mut self, bytes: &[u8], dest: SocketAddr) -> Result<()> {
        // A dropped outbox just means nobody is watching.
        if self.outbox_tx.send(SentDatagram { bytes: bytes.to_vec(), dest }).is_err() {
            trace!(%dest, "Replay outbox closed, discarding datagram");
        }
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}

impl std::fmt::Debug for ReplayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayTransport")
            .field("remaining", &self.queue.len())
            .field("delivered", &self.delivered)
            .field("paced", &self.pacing.is_some())
            .finish()
    }
}

impl From<Vec<RawPacket>> for ReplayTransport {
    fn from(packets: Vec<RawPacket>) -> Self {
        Self::from_packets(packets)
    }
}
