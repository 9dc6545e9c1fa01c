//! String decoding for ACSP datagrams.
//!
//! Server builds disagree on how strings go over the wire. Observed forms:
//!
//! | Form | Layout |
//! |---|---|
//! | unprefixed wide | 4-byte LE code units, terminated by a zero unit |
//! | prefixed wide | `u8 L`, then `L` 4-byte LE code units |
//! | prefixed UTF-16 | `u8 L`, then `L` UTF-16LE code units |
//! | prefixed narrow | `u8 L`, then `L` bytes of ASCII/UTF-8 |
//!
//! [`read_string`] tries them in exactly that order. The order is ambiguous for
//! short inputs, and both padded and unpadded servers exist, so the precedence
//! must stay as it is.

use crate::error::DecodeError;

use super::reader::PacketReader;

/// Length bytes above this are more plausible as a printable first character.
const MAX_PLAUSIBLE_LENGTH: u8 = 32;

/// Wire encodings this crate can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// One byte per character.
    Narrow,
    /// UTF-16LE, two bytes per code unit.
    Utf16,
    /// One little-endian `u32` per character.
    Wide,
}

/// Decode one string at the cursor.
///
/// On failure the cursor is restored to the length byte and the caller must
/// abandon the enclosing packet.
pub fn read_string(reader: &mut PacketReader<'_>) -> Result<String, DecodeError> {
    let start = reader.position();
    let length = reader.read_u8()?;
    if length == 0 {
        return Ok(String::new());
    }

    if length > MAX_PLAUSIBLE_LENGTH && reader.peek_at(0, 3) == Some(&[0, 0, 0][..]) {
        reader.seek(start);
        if let Some(text) = read_unprefixed_wide(reader) {
            return Ok(text);
        }
        reader.seek(start + 1);
    }

    let len = usize::from(length);

    if let Some(units) = reader.peek_at(0, len * 4)
        && units[1..4] == [0, 0, 0]
    {
        reader.skip(len * 4)?;
        let text: String = units
            .chunks_exact(4)
            .map(|unit| wide_char(u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]])))
            .collect();
        return Ok(text.trim_end().to_string());
    }

    if let Some(units) = reader.peek_at(0, len * 2)
        && units[1] == 0
    {
        reader.skip(len * 2)?;
        let code_units: Vec<u16> =
            units.chunks_exact(2).map(|unit| u16::from_le_bytes([unit[0], unit[1]])).collect();
        return Ok(until_nul(String::from_utf16_lossy(&code_units)));
    }

    if let Some(bytes) = reader.peek_at(0, len) {
        reader.skip(len)?;
        return Ok(until_nul(String::from_utf8_lossy(bytes).into_owned()));
    }

    reader.seek(start);
    Err(DecodeError::UndecodableString { offset: start, length })
}

/// Consume 4-byte units while their upper three bytes are zero.
///
/// A zero unit terminates the run and is consumed; a unit breaking the pattern
/// (or a short tail) stops the run without being consumed. Returns `None` when
/// nothing printable was produced.
fn read_unprefixed_wide(reader: &mut PacketReader<'_>) -> Option<String> {
    let mut text = String::new();
    while let Some(unit) = reader.peek_at(0, 4) {
        let value = u32::from_le_bytes([unit[0], unit[1], unit[2], unit[3]]);
        if value == 0 {
            reader.skip(4).ok()?;
            break;
        }
        if unit[1..4] != [0, 0, 0] {
            break;
        }
        text.push(wide_char(value));
        reader.skip(4).ok()?;
    }

    let trimmed = text.trim_end();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn wide_char(value: u32) -> char {
    char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn until_nul(mut text: String) -> String {
    if let Some(nul) = text.find('\0') {
        text.truncate(nul);
    }
    text
}

/// Append a length-prefixed string in the given encoding.
///
/// The length byte counts code units, so input is cut at 255 units.
pub fn write_string(buffer: &mut Vec<u8>, value: &str, encoding: StringEncoding) {
    match encoding {
        StringEncoding::Narrow => {
            let mut end = 0;
            for (index, ch) in value.char_indices() {
                if index + ch.len_utf8() > usize::from(u8::MAX) {
                    break;
                }
                end = index + ch.len_utf8();
            }
            buffer.push(end as u8);
            buffer.extend_from_slice(&value.as_bytes()[..end]);
        }
        StringEncoding::Utf16 => {
            let units: Vec<u16> = value.encode_utf16().take(usize::from(u8::MAX)).collect();
            buffer.push(units.len() as u8);
            for unit in units {
                buffer.extend_from_slice(&unit.to_le_bytes());
            }
        }
        StringEncoding::Wide => {
            let chars: Vec<char> = value.chars().take(usize::from(u8::MAX)).collect();
            buffer.push(chars.len() as u8);
            for ch in chars {
                buffer.extend_from_slice(&u32::from(ch).to_le_bytes());
            }
        }
    }
}
