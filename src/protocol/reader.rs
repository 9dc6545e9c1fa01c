//! Bounds-checked cursor over a single datagram.

use crate::error::DecodeError;

/// Forward-only reader over an immutable byte buffer.
///
/// Every primitive read either returns the value and advances by its width, or
/// fails with [`DecodeError::TruncatedField`] and leaves the cursor untouched.
/// Slicing always goes through `get`, so no input can push a read past the end
/// of the buffer.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread part of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        self.data.get(self.offset..).unwrap_or(&[])
    }

    /// Look at `len` bytes starting `skip` bytes after the cursor without moving.
    pub fn peek_at(&self, skip: usize, len: usize) -> Option<&'a [u8]> {
        let start = self.offset.checked_add(skip)?;
        let end = start.checked_add(len)?;
        self.data.get(start..end)
    }

    /// Consume exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let slice = self.peek_at(0, len).ok_or(DecodeError::TruncatedField {
            offset: self.offset,
            needed: len,
            remaining: self.remaining(),
        })?;
        self.offset += len;
        Ok(slice)
    }

    /// Advance past `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_bytes(len).map(|_| ())
    }

    /// Move the cursor back to a previously observed position.
    ///
    /// Positions beyond the buffer are clamped to its end.
    pub(crate) fn seek(&mut self, position: usize) {
        self.offset = position.min(self.data.len());
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32_le(&mut self) -> Result<f32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read three consecutive little-endian `f32` values.
    pub fn read_vec3(&mut self) -> Result<[f32; 3], DecodeError> {
        let bytes = self.read_bytes(12)?;
        let lane = |i: usize| {
            f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]])
        };
        Ok([lane(0), lane(4), lane(8)])
    }
}
