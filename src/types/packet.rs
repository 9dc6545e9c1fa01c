//! Raw datagram type for the stream-based architecture

use std::net::SocketAddr;
use std::sync::Arc;

/// One datagram as delivered by a transport.
///
/// This is the fundamental input unit. Everything else (events, state) is
/// derived from it; the bytes are never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    /// Datagram payload (shared, zero-copy via Arc)
    pub data: Arc<[u8]>,

    /// Address the datagram came from
    pub source: SocketAddr,
}

impl RawPacket {
    /// Create a new raw packet
    pub fn new(data: impl Into<Arc<[u8]>>, source: SocketAddr) -> Self {
        Self { data: data.into(), source }
    }

    /// Leading type tag, if the datagram is non-empty.
    pub fn tag(&self) -> Option<u8> {
        self.data.first().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
