//! Datagram builders shared by unit tests and benchmarks.
//!
//! Everything here writes the same byte layouts a server would, so tests can
//! describe packets field by field instead of as opaque byte arrays.

#![cfg(any(test, feature = "benchmark"))]

use std::net::SocketAddr;

use crate::protocol::{StringEncoding, write_string};
use crate::transports::replay::REPLAY_SOURCE;
use crate::types::RawPacket;

/// Little-endian datagram writer.
#[derive(Debug, Clone)]
pub struct DatagramBuilder {
    buffer: Vec<u8>,
}

impl DatagramBuilder {
    pub fn new(tag: u8) -> Self {
        Self { buffer: vec![tag] }
    }

    pub fn u8(mut self, value: u8) -> Self {
        self.buffer.push(value);
        self
    }

    pub fn u16(mut self, value: u16) -> Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(mut self, value: f32) -> Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.buffer.extend_from_slice(bytes);
        self
    }

    /// Length-prefixed string in the given encoding.
    pub fn string(mut self, value: &str, encoding: StringEncoding) -> Self {
        write_string(&mut self.buffer, value, encoding);
        self
    }

    /// Wide string with no length prefix, terminated by a zero unit.
    pub fn unprefixed_wide(mut self, value: &str) -> Self {
        self.buffer.extend(encode_unprefixed_wide(value));
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

/// 4-bytes-per-character run with a trailing zero unit and no length byte.
pub fn encode_unprefixed_wide(value: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((value.chars().count() + 1) * 4);
    for ch in value.chars() {
        bytes.extend_from_slice(&u32::from(ch).to_le_bytes());
    }
    bytes.extend_from_slice(&[0; 4]);
    bytes
}

/// Wrap bytes as if they arrived from the replay source address.
pub fn raw(data: Vec<u8>) -> RawPacket {
    RawPacket::new(data, REPLAY_SOURCE)
}

pub fn raw_from(data: Vec<u8>, source: SocketAddr) -> RawPacket {
    RawPacket::new(data, source)
}

pub fn new_session(server: &str, track: &str, config: &str, session: &str) -> Vec<u8> {
    DatagramBuilder::new(50)
        .u8(4)
        .u8(0)
        .u8(0)
        .u8(1)
        .string(server, StringEncoding::Narrow)
        .string(track, StringEncoding::Narrow)
        .string(config, StringEncoding::Narrow)
        .string(session, StringEncoding::Narrow)
        .build()
}

/// NEW_CAR_CONNECTION with a wide name and narrow remaining strings.
pub fn car_connection(car_id: u8, name: &str) -> Vec<u8> {
    DatagramBuilder::new(51)
        .u8(car_id)
        .string(name, StringEncoding::Wide)
        .string("76561199230780195", StringEncoding::Narrow)
        .u8(1)
        .string("ks_toyota_ae86", StringEncoding::Narrow)
        .string("drift", StringEncoding::Narrow)
        .build()
}

pub fn lap_completed(car_id: u8, lap_time_millis: u32, cuts: u8) -> Vec<u8> {
    DatagramBuilder::new(58).u8(car_id).u32(lap_time_millis).u8(cuts).build()
}

/// LEADERBOARD_UPDATE in either id layout.
pub fn leaderboard(entries: &[(u8, u32)], wide_ids: bool) -> Vec<u8> {
    let mut builder = DatagramBuilder::new(73).u8(1).u32(0).u8(entries.len() as u8);
    if wide_ids {
        builder = builder.u16(0);
    }
    for &(car_id, time) in entries {
        builder = builder.u32(time);
        builder = if wide_ids { builder.u32(u32::from(car_id)) } else { builder.u8(car_id) };
    }
    builder.build()
}

pub fn realtime_update(car_id: u8, position: [f32; 3], velocity: [f32; 3], distance_m: f32) -> Vec<u8> {
    let mut builder = DatagramBuilder::new(130).u8(car_id).u8(4);
    for value in position.into_iter().chain(velocity) {
        builder = builder.f32(value);
    }
    builder.f32(distance_m).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_writes_little_endian() {
        let data = DatagramBuilder::new(58).u8(4).u32(86_120).u8(0).build();
        assert_eq!(data, vec![58, 4, 0x68, 0x50, 0x01, 0x00, 0]);
    }

    #[test]
    fn unprefixed_wide_is_zero_terminated() {
        assert_eq!(encode_unprefixed_wide("Po"), vec![b'P', 0, 0, 0, b'o', 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn wide_leaderboard_has_padding() {
        let narrow = leaderboard(&[(4, 85_430)], false);
        let wide = leaderboard(&[(4, 85_430)], true);
        assert_eq!(narrow.len(), 7 + 5);
        assert_eq!(wide.len(), 7 + 2 + 8);
    }
}
