//! Byte-level datagram helpers for integration tests.
//!
//! These encode strings independently of the crate's own writer so the tests
//! check the decoder against hand-built server layouts.

#![allow(dead_code)]

use std::net::SocketAddr;

use acsp::RawPacket;

pub fn server_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 11000))
}

pub fn raw(data: Vec<u8>) -> RawPacket {
    RawPacket::new(data, server_addr())
}

pub fn narrow(value: &str) -> Vec<u8> {
    let mut bytes = vec![value.len() as u8];
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

pub fn utf16(value: &str) -> Vec<u8> {
    let units: Vec<u16> = value.encode_utf16().collect();
    let mut bytes = vec![units.len() as u8];
    for unit in units {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

pub fn wide(value: &str) -> Vec<u8> {
    let mut bytes = vec![value.chars().count() as u8];
    for ch in value.chars() {
        bytes.extend_from_slice(&u32::from(ch).to_le_bytes());
    }
    bytes
}

/// Wide characters with no length prefix, zero terminated.
pub fn unprefixed_wide(value: &str) -> Vec<u8> {
    let mut bytes = wide(value).split_off(1);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes
}

pub fn datagram(tag: u8, parts: &[&[u8]]) -> Vec<u8> {
    let mut bytes = vec![tag];
    for part in parts {
        bytes.extend_from_slice(part);
    }
    bytes
}

pub fn scenario_a_session() -> Vec<u8> {
    datagram(
        50,
        &[
            &[1, 0, 0, 1],
            &narrow("Drift Server"),
            &narrow("vallelunga"),
            &narrow("drift"),
            &narrow("Practice"),
        ],
    )
}

pub fn scenario_b_connect() -> Vec<u8> {
    datagram(
        51,
        &[
            &[4],
            &wide("Porx"),
            &narrow("76561199230780195"),
            &[1],
            &narrow("ks_toyota_ae86"),
            &narrow("drift"),
        ],
    )
}

pub fn lap(car_id: u8, lap_time_millis: u32, cuts: u8) -> Vec<u8> {
    datagram(58, &[&[car_id], &lap_time_millis.to_le_bytes(), &[cuts]])
}

pub fn realtime(car_id: u8, velocity: [f32; 3], distance_m: f32) -> Vec<u8> {
    let mut bytes = vec![130, car_id, 4];
    for value in [0.0f32, 0.0, 0.0].into_iter().chain(velocity).chain([distance_m]) {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}
