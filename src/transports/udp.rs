//! UDP socket transport

use std::io::ErrorKind;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, info, trace};

use crate::transport::Transport;
use crate::types::RawPacket;
use crate::{AcspError, Result};

/// Largest datagram the server plugin interface emits comfortably fits here.
pub const MAX_DATAGRAM: usize = 4096;

/// Transport over a bound tokio [`UdpSocket`].
pub struct UdpTransport {
    socket: UdpSocket,
    buffer: Box<[u8]>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket =
            UdpSocket::bind(addr).await.map_err(|source| AcspError::Bind { addr, source })?;
        let local = socket.local_addr()?;
        info!(%local, "ACSP listener bound");
        Ok(Self::from_socket(socket))
    }

    /// Wrap an already bound socket.
    pub fn from_socket(socket: UdpSocket) -> Self {
        Self { socket, buffer: vec![0u8; MAX_DATAGRAM].into_boxed_slice() }
    }
}

#[async_trait::async_trait]
impl Transport for UdpTransport {
    async fn recv(&mut self) -> Result<Option<RawPacket>> {
        loop {
            match self.socket.recv_from(&mut self.buffer).await {
                Ok((len, source)) => {
                    trace!(len, %source, "Datagram received");
                    return Ok(Some(RawPacket::new(&self.buffer[..len], source)));
                }
                // Windows reports ICMP port-unreachable for an earlier send as
                // a reset on the next receive.
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    debug!("Ignoring UDP connection reset: {}", e);
                }
                Err(e) => return Err(AcspError::transport_io("recv_from failed", e)),
            }
        }
    }

    async fn send(&mut self, bytes: &[u8], dest: SocketAddr) -> Result<()> {
        let sent = self
            .socket
            .send_to(bytes, dest)
            .await
            .map_err(|e| AcspError::transport_io(format!("send_to {dest} failed"), e))?;
        if sent != bytes.len() {
            return Err(AcspError::transport_failed(format!(
                "short send to {dest}: {sent} of {} bytes",
                bytes.len()
            )));
        }
        trace!(len = sent, %dest, "Datagram sent");
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }
}
