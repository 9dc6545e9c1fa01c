//! Concrete [`Transport`](crate::transport::Transport) implementations.

pub mod replay;
pub mod udp;

pub use replay::{ReplayTransport, SentDatagram};
pub use udp::UdpTransport;
