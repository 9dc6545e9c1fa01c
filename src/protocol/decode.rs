//! Per-type field layouts.
//!
//! Each decoder is a small function over [`PacketReader`]. A decoder either
//! returns the whole packet or an error; nothing is applied to state here, so a
//! failure halfway through a packet cannot leave anything partially updated.

use crate::error::DecodeError;
use crate::types::{DriverInfo, LeaderboardEntry, SessionInfo, SessionKind, StandingEntry, TelemetrySample};

use super::PacketType;
use super::reader::PacketReader;
use super::strings::read_string;

/// Leaderboard times at or above this are treated as garbage.
const MAX_LEADERBOARD_TIME: u32 = i32::MAX as u32;

/// Bytes per leaderboard entry when car ids are 4 bytes wide.
const WIDE_LEADERBOARD_ENTRY: usize = 8;

/// `u8 kind, u16 time, u16 laps, u16 wait`
const SESSION_TRAILER_LEN: usize = 7;

/// `u8 car, u32 time, u16 laps, u8 completed`
const STANDING_ENTRY_LEN: usize = 8;

/// Fully decoded inbound packet, before any state is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    NewSession(SessionInfo),
    NewCarConnection {
        driver: DriverInfo,
        /// Undocumented byte between the GUID and the car model.
        flag: u8,
    },
    CarDisconnected {
        car_id: u8,
        name: Option<String>,
    },
    LapCompleted(LapPacket),
    LeaderboardUpdate(LeaderboardPacket),
    RealtimeCarUpdate(TelemetrySample),
}

impl Packet {
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::NewSession(_) => PacketType::NewSession,
            Packet::NewCarConnection { .. } => PacketType::NewCarConnection,
            Packet::CarDisconnected { .. } => PacketType::CarDisconnected,
            Packet::LapCompleted(_) => PacketType::LapCompleted,
            Packet::LeaderboardUpdate(_) => PacketType::LeaderboardUpdate,
            Packet::RealtimeCarUpdate(_) => PacketType::RealtimeCarUpdate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LapPacket {
    pub car_id: u8,
    pub lap_time_millis: u32,
    pub cuts: u8,
    /// Empty unless the server appended a complete standings block.
    pub standings: Vec<StandingEntry>,
    pub grip_level: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardPacket {
    pub protocol_version: u8,
    pub session_time_millis: u32,
    pub entries: Vec<LeaderboardEntry>,
    pub rejected: Vec<DecodeError>,
}

/// What a datagram decoded to.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Packet(Packet),
    /// No decoder is registered for this tag.
    Unknown(u8),
}

/// Decode one datagram.
pub fn decode(data: &[u8]) -> Result<Decoded, DecodeError> {
    let mut reader = PacketReader::new(data);
    let tag = reader.read_u8()?;
    let Some(kind) = PacketType::from_tag(tag) else {
        return Ok(Decoded::Unknown(tag));
    };

    let packet = match kind {
        PacketType::NewSession => Packet::NewSession(decode_new_session(&mut reader)?),
        PacketType::NewCarConnection => decode_new_car_connection(&mut reader)?,
        PacketType::CarDisconnected => decode_car_disconnected(&mut reader)?,
        PacketType::LapCompleted => Packet::LapCompleted(decode_lap_completed(&mut reader)?),
        PacketType::LeaderboardUpdate => {
            Packet::LeaderboardUpdate(decode_leaderboard(&mut reader)?)
        }
        PacketType::RealtimeCarUpdate => {
            Packet::RealtimeCarUpdate(decode_realtime_car_update(&mut reader)?)
        }
    };

    Ok(Decoded::Packet(packet))
}

fn decode_new_session(reader: &mut PacketReader<'_>) -> Result<SessionInfo, DecodeError> {
    let protocol_version = reader.read_u8()?;
    let session_index = reader.read_u8()?;
    let current_session_index = reader.read_u8()?;
    let session_count = reader.read_u8()?;
    let server_name = read_string(reader)?;
    let track_name = read_string(reader)?;
    let track_config = read_string(reader)?;
    let session_name = read_string(reader)?;

    let mut session = SessionInfo {
        protocol_version,
        session_index,
        current_session_index,
        session_count,
        server_name,
        track_name,
        track_config,
        session_name,
        kind: None,
        time_minutes: None,
        laps: None,
        wait_time_secs: None,
    };

    if reader.remaining() >= SESSION_TRAILER_LEN {
        session.kind = Some(SessionKind::from(reader.read_u8()?));
        session.time_minutes = Some(reader.read_u16_le()?);
        session.laps = Some(reader.read_u16_le()?);
        session.wait_time_secs = Some(reader.read_u16_le()?);
    }

    Ok(session)
}

fn decode_new_car_connection(reader: &mut PacketReader<'_>) -> Result<Packet, DecodeError> {
    let car_id = reader.read_u8()?;
    let name = read_string(reader)?;
    let guid = read_string(reader)?;
    let flag = reader.read_u8()?;
    let model = read_string(reader)?;
    let skin = read_string(reader)?;

    Ok(Packet::NewCarConnection { driver: DriverInfo::new(car_id, name, guid, model, skin), flag })
}

fn decode_car_disconnected(reader: &mut PacketReader<'_>) -> Result<Packet, DecodeError> {
    let car_id = reader.read_u8()?;
    // Older servers stop after the car id.
    let name = if reader.is_empty() { None } else { Some(read_string(reader)?) };
    Ok(Packet::CarDisconnected { car_id, name })
}

fn decode_lap_completed(reader: &mut PacketReader<'_>) -> Result<LapPacket, DecodeError> {
    let car_id = reader.read_u8()?;
    let lap_time_millis = reader.read_u32_le()?;
    let cuts = reader.read_u8()?;

    let (standings, grip_level) = match read_standings(reader) {
        Some((standings, grip)) => (standings, Some(grip)),
        None => (Vec::new(), None),
    };

    Ok(LapPacket { car_id, lap_time_millis, cuts, standings, grip_level })
}

/// Decode the optional standings block, committing only if it is complete.
fn read_standings(reader: &mut PacketReader<'_>) -> Option<(Vec<StandingEntry>, f32)> {
    if reader.is_empty() {
        return None;
    }

    let mut probe = reader.clone();
    let count = usize::from(probe.read_u8().ok()?);
    if probe.remaining() < count * STANDING_ENTRY_LEN + 4 {
        return None;
    }

    let mut standings = Vec::with_capacity(count);
    for _ in 0..count {
        standings.push(StandingEntry {
            car_id: probe.read_u8().ok()?,
            time_millis: probe.read_u32_le().ok()?,
            laps: probe.read_u16_le().ok()?,
            completed: probe.read_u8().ok()? != 0,
        });
    }
    let grip = probe.read_f32_le().ok()?;

    *reader = probe;
    Some((standings, grip))
}

fn decode_leaderboard(reader: &mut PacketReader<'_>) -> Result<LeaderboardPacket, DecodeError> {
    let protocol_version = reader.read_u8()?;
    let session_time_millis = reader.read_u32_le()?;
    let car_count = reader.read_u8()?;

    // Servers disagree on the car id width. More bytes than the wide layout
    // needs means a 2-byte pad precedes wide (u32) ids; otherwise ids are u8.
    // This misclassifies when the buffer size happens to line up.
    let wide_ids = reader.remaining() > usize::from(car_count) * WIDE_LEADERBOARD_ENTRY;
    if wide_ids {
        reader.skip(2)?;
    }

    let mut entries = Vec::with_capacity(usize::from(car_count));
    let mut rejected = Vec::new();
    for _ in 0..car_count {
        let best_time_millis = reader.read_u32_le()?;
        let raw_car_id =
            if wide_ids { reader.read_u32_le()? } else { u32::from(reader.read_u8()?) };

        match leaderboard_entry(raw_car_id, best_time_millis) {
            Ok(entry) => entries.push(entry),
            Err(err) => rejected.push(err),
        }
    }

    Ok(LeaderboardPacket { protocol_version, session_time_millis, entries, rejected })
}

fn leaderboard_entry(raw_car_id: u32, best_time_millis: u32) -> Result<LeaderboardEntry, DecodeError> {
    let car_id = u8::try_from(raw_car_id).map_err(|_| DecodeError::OutOfRangeValue {
        field: "car_id",
        value: u64::from(raw_car_id),
    })?;

    if best_time_millis >= MAX_LEADERBOARD_TIME {
        return Err(DecodeError::OutOfRangeValue {
            field: "best_time_millis",
            value: u64::from(best_time_millis),
        });
    }

    Ok(LeaderboardEntry { car_id, best_time_millis })
}

fn decode_realtime_car_update(
    reader: &mut PacketReader<'_>,
) -> Result<TelemetrySample, DecodeError> {
    let car_id = reader.read_u8()?;
    let protocol_version = reader.read_u8()?;
    let position = reader.read_vec3()?;
    let velocity = reader.read_vec3()?;
    let distance_m = reader.read_f32_le()?;

    Ok(TelemetrySample { car_id, protocol_version, position, velocity, distance_m })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StringEncoding;
    use crate::test_utils::DatagramBuilder;
    use proptest::prelude::*;

    fn packet(data: &[u8]) -> Packet {
        match decode(data) {
            Ok(Decoded::Packet(packet)) => packet,
            other => panic!("expected a packet, got {other:?}"),
        }
    }

    #[test]
    fn new_session_with_narrow_strings() {
        let data = DatagramBuilder::new(50)
            .u8(1)
            .u8(0)
            .u8(0)
            .u8(1)
            .string("Drift Server", StringEncoding::Narrow)
            .string("vallelunga", StringEncoding::Narrow)
            .string("drift", StringEncoding::Narrow)
            .string("Practice", StringEncoding::Narrow)
            .build();

        let Packet::NewSession(session) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(session.server_name, "Drift Server");
        assert_eq!(session.track_name, "vallelunga");
        assert_eq!(session.track_config, "drift");
        assert_eq!(session.session_name, "Practice");
        assert_eq!(session.protocol_version, 1);
        assert_eq!(session.session_count, 1);
        assert_eq!(session.kind, None);
    }

    #[test]
    fn new_session_trailer_is_decoded_when_complete() {
        let data = DatagramBuilder::new(50)
            .u8(4)
            .u8(2)
            .u8(2)
            .u8(3)
            .string("Server", StringEncoding::Wide)
            .string("monza", StringEncoding::Wide)
            .string("", StringEncoding::Wide)
            .string("Race", StringEncoding::Wide)
            .u8(4)
            .u16(0)
            .u16(12)
            .u16(60)
            .build();

        let Packet::NewSession(session) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(session.track_name, "monza");
        assert_eq!(session.kind, Some(SessionKind::Race));
        assert_eq!(session.laps, Some(12));
        assert_eq!(session.wait_time_secs, Some(60));
    }

    #[test]
    fn short_session_trailer_is_ignored() {
        let data = DatagramBuilder::new(50)
            .u8(4)
            .u8(0)
            .u8(0)
            .u8(1)
            .string("Drift Server", StringEncoding::Narrow)
            .string("vallelunga", StringEncoding::Narrow)
            .string("drift", StringEncoding::Narrow)
            .string("Practice", StringEncoding::Narrow)
            .u8(2)
            .u16(10)
            .build();

        let Packet::NewSession(session) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(session.kind, None);
        assert_eq!(session.time_minutes, None);
    }

    #[test]
    fn car_connection_with_mixed_encodings() {
        let data = DatagramBuilder::new(51)
            .u8(4)
            .string("Porx", StringEncoding::Wide)
            .string("76561199230780195", StringEncoding::Narrow)
            .u8(1)
            .string("ks_toyota_ae86", StringEncoding::Narrow)
            .string("drift", StringEncoding::Narrow)
            .build();

        let Packet::NewCarConnection { driver, flag } = packet(&data) else {
            panic!("wrong packet")
        };
        assert_eq!(driver, DriverInfo::new(4, "Porx", "76561199230780195", "ks_toyota_ae86", "drift"));
        assert_eq!(flag, 1);
    }

    #[test]
    fn disconnect_name_is_optional() {
        assert_eq!(packet(&[52, 7]), Packet::CarDisconnected { car_id: 7, name: None });

        let data = DatagramBuilder::new(52).u8(7).string("Porx", StringEncoding::Utf16).build();
        assert_eq!(
            packet(&data),
            Packet::CarDisconnected { car_id: 7, name: Some("Porx".to_string()) }
        );

    }

    #[test]
    fn unreadable_disconnect_name_is_malformed() {
        assert_eq!(
            decode(&[52, 7, 200]),
            Err(DecodeError::UndecodableString { offset: 2, length: 200 })
        );
    }

    #[test]
    fn lap_without_standings() {
        let data = DatagramBuilder::new(58).u8(4).u32(86_120).u8(0).build();
        let Packet::LapCompleted(lap) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(lap.car_id, 4);
        assert_eq!(lap.lap_time_millis, 86_120);
        assert_eq!(lap.cuts, 0);
        assert!(lap.standings.is_empty());
        assert_eq!(lap.grip_level, None);
    }

    #[test]
    fn lap_with_complete_standings_block() {
        let data = DatagramBuilder::new(58)
            .u8(4)
            .u32(86_120)
            .u8(2)
            .u8(2)
            .u8(4)
            .u32(86_120)
            .u16(3)
            .u8(0)
            .u8(9)
            .u32(91_000)
            .u16(2)
            .u8(1)
            .f32(0.98)
            .build();

        let Packet::LapCompleted(lap) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(lap.cuts, 2);
        assert_eq!(lap.standings.len(), 2);
        assert_eq!(
            lap.standings[1],
            StandingEntry { car_id: 9, time_millis: 91_000, laps: 2, completed: true }
        );
        assert_eq!(lap.grip_level, Some(0.98));
    }

    #[test]
    fn incomplete_standings_block_is_dropped() {
        let data = DatagramBuilder::new(58).u8(4).u32(86_120).u8(0).u8(3).u8(4).build();
        let Packet::LapCompleted(lap) = packet(&data) else { panic!("wrong packet") };
        assert!(lap.standings.is_empty());
    }

    #[test]
    fn truncated_lap_is_an_error() {
        assert_eq!(
            decode(&[58, 0x01]),
            Err(DecodeError::TruncatedField { offset: 2, needed: 4, remaining: 0 })
        );
    }

    #[test]
    fn leaderboard_with_narrow_car_ids() {
        let data = DatagramBuilder::new(73)
            .u8(1)
            .u32(500_000)
            .u8(2)
            .u32(85_430)
            .u8(4)
            .u32(90_000)
            .u8(9)
            .build();

        let Packet::LeaderboardUpdate(board) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(board.session_time_millis, 500_000);
        assert_eq!(
            board.entries,
            vec![
                LeaderboardEntry { car_id: 4, best_time_millis: 85_430 },
                LeaderboardEntry { car_id: 9, best_time_millis: 90_000 },
            ]
        );
        assert!(board.rejected.is_empty());
    }

    #[test]
    fn leaderboard_with_padding_and_wide_car_ids() {
        let data = DatagramBuilder::new(73)
            .u8(1)
            .u32(500_000)
            .u8(1)
            .u16(0)
            .u32(85_430)
            .u32(4)
            .build();

        let Packet::LeaderboardUpdate(board) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(board.entries, vec![LeaderboardEntry { car_id: 4, best_time_millis: 85_430 }]);
    }

    #[test]
    fn leaderboard_exact_wide_size_reads_narrow_ids() {
        // One wide entry with no pad is exactly 8 bytes, which the width
        // heuristic reads as a narrow entry; the low byte still names car 4.
        let data = DatagramBuilder::new(73).u8(1).u32(500_000).u8(1).u32(85_430).u32(4).build();

        let Packet::LeaderboardUpdate(board) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(board.entries, vec![LeaderboardEntry { car_id: 4, best_time_millis: 85_430 }]);
    }

    #[test]
    fn leaderboard_rejects_out_of_range_entries_only() {
        let data = DatagramBuilder::new(73)
            .u8(1)
            .u32(0)
            .u8(3)
            .u16(0)
            .u32(u32::MAX)
            .u32(1)
            .u32(80_000)
            .u32(300)
            .u32(81_000)
            .u32(2)
            .build();

        let Packet::LeaderboardUpdate(board) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(board.entries, vec![LeaderboardEntry { car_id: 2, best_time_millis: 81_000 }]);
        assert_eq!(
            board.rejected,
            vec![
                DecodeError::OutOfRangeValue {
                    field: "best_time_millis",
                    value: u64::from(u32::MAX)
                },
                DecodeError::OutOfRangeValue { field: "car_id", value: 300 },
            ]
        );
    }

    #[test]
    fn leaderboard_missing_entries_is_truncated() {
        let data = DatagramBuilder::new(73).u8(1).u32(0).u8(2).u32(85_430).u8(4).build();
        assert!(matches!(decode(&data), Err(DecodeError::TruncatedField { .. })));
    }

    #[test]
    fn realtime_update_projects_sample() {
        let data = DatagramBuilder::new(130)
            .u8(4)
            .u8(4)
            .f32(10.0)
            .f32(2.0)
            .f32(-5.0)
            .f32(30.0)
            .f32(0.0)
            .f32(40.0)
            .f32(1234.5)
            .build();

        let Packet::RealtimeCarUpdate(sample) = packet(&data) else { panic!("wrong packet") };
        assert_eq!(sample.car_id, 4);
        assert_eq!(sample.position, [10.0, 2.0, -5.0]);
        assert_eq!(sample.distance_m, 1234.5);
        assert!((sample.speed_kmh() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_tag_is_not_an_error() {
        assert_eq!(decode(&[54, 1, 2, 3]), Ok(Decoded::Unknown(54)));
        assert_eq!(decode(&[255]), Ok(Decoded::Unknown(255)));
    }

    #[test]
    fn empty_datagram_is_truncated() {
        assert!(matches!(decode(&[]), Err(DecodeError::TruncatedField { offset: 0, .. })));
    }

    proptest! {
        #[test]
        fn decode_never_panics_on_arbitrary_input(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode(&data);
        }

        #[test]
        fn decode_never_panics_on_known_tags(
            tag in prop::sample::select(vec![50u8, 51, 52, 58, 73, 130]),
            body in prop::collection::vec(any::<u8>(), 0..96),
        ) {
            let mut data = vec![tag];
            data.extend(body);
            let _ = decode(&data);
        }

        #[test]
        fn every_prefix_of_a_valid_lap_fails_cleanly(cut in 0usize..7) {
            let data = DatagramBuilder::new(58).u8(4).u32(86_120).u8(0).build();
            let result = decode(&data[..cut]);
            let is_truncated = matches!(result, Err(DecodeError::TruncatedField { .. }));
            prop_assert!(is_truncated);
        }
    }
}
