//! ACSP wire protocol: packet tags, cursor reader, string codec, decoders and
//! outbound commands.
//!
//! Inbound and outbound tags share one numeric namespace. Inbound tags are
//! modelled by [`PacketType`], outbound ones by [`Command`].
//!
//! ```rust
//! use acsp::protocol::{decode, Decoded, Packet};
//!
//! let datagram = [58, 4, 0x68, 0x50, 0x01, 0x00, 0];
//! match decode(&datagram)? {
//!     Decoded::Packet(Packet::LapCompleted(lap)) => assert_eq!(lap.lap_time_millis, 86_120),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok::<(), acsp::DecodeError>(())
//! ```

mod command;
mod decode;
mod reader;
mod strings;

pub use command::Command;
pub use decode::{Decoded, LapPacket, LeaderboardPacket, Packet, decode};
pub use reader::PacketReader;
pub use strings::{StringEncoding, read_string, write_string};

/// Inbound packet types with a registered decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    NewSession = 50,
    NewCarConnection = 51,
    CarDisconnected = 52,
    LapCompleted = 58,
    /// Vendor extension
    LeaderboardUpdate = 73,
    /// Vendor extension
    RealtimeCarUpdate = 130,
}

impl PacketType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            50 => Some(PacketType::NewSession),
            51 => Some(PacketType::NewCarConnection),
            52 => Some(PacketType::CarDisconnected),
            58 => Some(PacketType::LapCompleted),
            73 => Some(PacketType::LeaderboardUpdate),
            130 => Some(PacketType::RealtimeCarUpdate),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketType::NewSession => "NEW_SESSION",
            PacketType::NewCarConnection => "NEW_CAR_CONNECTION",
            PacketType::CarDisconnected => "CAR_DISCONNECTED",
            PacketType::LapCompleted => "LAP_COMPLETED",
            PacketType::LeaderboardUpdate => "LEADERBOARD_UPDATE",
            PacketType::RealtimeCarUpdate => "REALTIME_CAR_UPDATE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for tag in 0..=u8::MAX {
            if let Some(kind) = PacketType::from_tag(tag) {
                assert_eq!(kind.tag(), tag);
            }
        }
        assert_eq!(PacketType::from_tag(130), Some(PacketType::RealtimeCarUpdate));
        assert_eq!(PacketType::from_tag(54), None);
        assert_eq!(PacketType::from_tag(200), None);
    }
}
