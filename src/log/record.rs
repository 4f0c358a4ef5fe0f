//! Log record encoding
//!
//! Encodes and decodes a single record of the log.

use bytes::{Buf, BufMut};

use crate::error::{FileKvError, Result};

/// Size of the fixed record header: timestamp, key length, value length
pub const HEADER_SIZE: usize = 12;

/// Value length reserved for tombstone records
pub const TOMBSTONE_MARKER: u32 = u32::MAX;

/// The fixed-size header in front of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Seconds since the Unix epoch when the record was written
    pub timestamp: u32,

    pub key_len: u32,

    /// Length of the value, or [`TOMBSTONE_MARKER`]
    pub value_len: u32,
}

impl RecordHeader {
    /// Write the header into `buf` as three little-endian u32
    pub fn write_to<B: BufMut>(&self, buf: &mut B) {
        buf.put_u32_le(self.timestamp);
        buf.put_u32_le(self.key_len);
        buf.put_u32_le(self.value_len);
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        let mut dst = &mut bytes[..];
        self.write_to(&mut dst);
        bytes
    }

    pub fn from_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        let mut src = &bytes[..];
        let timestamp = src.get_u32_le();
        let key_len = src.get_u32_le();
        let value_len = src.get_u32_le();
        Self {
            timestamp,
            key_len,
            value_len,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value_len == TOMBSTONE_MARKER
    }

    /// Number of value bytes that follow the key
    pub fn value_bytes(&self) -> u64 {
        if self.is_tombstone() {
            0
        } else {
            self.value_len as u64
        }
    }

    /// Number of bytes that follow the header
    pub fn body_len(&self) -> u64 {
        self.key_len as u64 + self.value_bytes()
    }

    /// Total on-disk size of the record, header included
    pub fn record_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.body_len()
    }
}

/// A decoded record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: u32,
    pub key: Vec<u8>,
    /// `None` for a tombstone
    pub value: Option<Vec<u8>>,
}

impl Record {
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Split a record body (key followed by value) read after `header`.
    ///
    /// `body` must be exactly `header.body_len()` bytes long.
    pub(crate) fn from_parts(header: RecordHeader, mut body: Vec<u8>) -> Self {
        let value = body.split_off(header.key_len as usize);
        Self {
            timestamp: header.timestamp,
            key: body,
            value: (!header.is_tombstone()).then_some(value),
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a key/value record
///
/// Format: header (12) + key + value
pub fn encode(timestamp: u32, key: &[u8], value: &[u8]) -> Result<Vec<u8>> {
    let header = RecordHeader {
        timestamp,
        key_len: length_field("key", key.len(), u32::MAX)?,
        value_len: length_field("value", value.len(), TOMBSTONE_MARKER - 1)?,
    };

    let mut buf = Vec::with_capacity(HEADER_SIZE + key.len() + value.len());
    header.write_to(&mut buf);
    buf.put_slice(key);
    buf.put_slice(value);
    Ok(buf)
}

/// Encode a tombstone for `key`
///
/// Format: header (12, value length = [`TOMBSTONE_MARKER`]) + key
pub fn encode_tombstone(timestamp: u32, key: &[u8]) -> Result<Vec<u8>> {
    let header = RecordHeader {
        timestamp,
        key_len: length_field("key", key.len(), u32::MAX)?,
        value_len: TOMBSTONE_MARKER,
    };

    let mut buf = Vec::with_capacity(HEADER_SIZE + key.len());
    header.write_to(&mut buf);
    buf.put_slice(key);
    Ok(buf)
}

fn length_field(field: &'static str, len: usize, max: u32) -> Result<u32> {
    u32::try_from(len)
        .ok()
        .filter(|n| *n <= max)
        .ok_or(FileKvError::RecordTooLarge { field, len })
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a record from exactly one record's worth of bytes
pub fn decode(bytes: &[u8]) -> Result<Record> {
    decode_at(bytes, 0)
}

/// Decode a record read from `offset`; the offset is only used in errors
pub fn decode_at(bytes: &[u8], offset: u64) -> Result<Record> {
    if bytes.len() < HEADER_SIZE {
        return Err(FileKvError::corrupt(
            offset,
            format!(
                "incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            ),
        ));
    }

    let mut head = [0u8; HEADER_SIZE];
    head.copy_from_slice(&bytes[..HEADER_SIZE]);
    let header = RecordHeader::from_bytes(head);

    let body = &bytes[HEADER_SIZE..];
    if body.len() as u64 != header.body_len() {
        return Err(FileKvError::corrupt(
            offset,
            format!(
                "record length mismatch: header declares {} body bytes, got {}",
                header.body_len(),
                body.len()
            ),
        ));
    }

    Ok(Record::from_parts(header, body.to_vec()))
}
