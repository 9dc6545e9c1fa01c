//! Transport trait for datagram sources

use std::net::SocketAddr;

use crate::Result;
use crate::types::RawPacket;

/// Moves raw datagrams in and out.
///
/// Transports abstract over where datagrams come from (a bound UDP socket, an
/// in-memory capture) and handle their own timing. The driver task is the
/// only caller, so at most one `recv` is in flight at a time.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// Wait for the next inbound datagram.
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - a datagram arrived
    /// - `Ok(None)` - the source is exhausted (normal termination)
    /// - `Err(e)` - receive failed; the driver retries with backoff
    ///
    /// Must be cancel safe: the driver races it against commands and shutdown.
    async fn recv(&mut self) -> Result<Option<RawPacket>>;

    /// Send one outbound datagram. Fire-and-forget, no acknowledgement.
    async fn send(&mut self, bytes: &[u8], dest: SocketAddr) -> Result<()>;

    /// Local address, when the transport has one.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}
