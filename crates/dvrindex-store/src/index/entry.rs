//! Index record codec.
//!
//! An index file has no header and no framing: it is a dense array of
//! records, each an 8-byte timestamp followed by an 8-byte offset, both
//! little-endian. Record `i` always starts at byte `i * ENTRY_SIZE`.

use serde::Serialize;

/// Size in bytes of one encoded record.
pub const ENTRY_SIZE: u64 = 16;

/// One `(timestamp, offset)` sample of a segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IndexEntry {
    /// PTS or wall-clock milliseconds; non-decreasing within a file.
    pub timestamp: u64,
    /// Byte position in the segment file.
    pub offset: u64,
}

impl IndexEntry {
    pub fn new(timestamp: u64, offset: u64) -> Self {
        Self { timestamp, offset }
    }

    /// Encode into the on-disk record layout.
    pub fn encode(&self) -> [u8; ENTRY_SIZE as usize] {
        let mut buf = [0u8; ENTRY_SIZE as usize];
        buf[..8].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[8..].copy_from_slice(&self.offset.to_le_bytes());
        buf
    }

    /// Decode one on-disk record.
    pub fn decode(buf: &[u8; ENTRY_SIZE as usize]) -> Self {
        let mut timestamp = [0u8; 8];
        let mut offset = [0u8; 8];
        timestamp.copy_from_slice(&buf[..8]);
        offset.copy_from_slice(&buf[8..]);
        Self {
            timestamp: u64::from_le_bytes(timestamp),
            offset: u64::from_le_bytes(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let entry = IndexEntry::new(0x0102_0304_0506_0708, 0x1112_1314_1516_1718);
        let buf = entry.encode();
        assert_eq!(
            buf,
            [
                0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // timestamp
                0x18, 0x17, 0x16, 0x15, 0x14, 0x13, 0x12, 0x11, // offset
            ]
        );
    }

    #[test]
    fn test_decode_extremes() {
        let entry = IndexEntry::new(u64::MAX, 0);
        assert_eq!(IndexEntry::decode(&entry.encode()), entry);

        let buf = [0xFFu8; 16];
        let entry = IndexEntry::decode(&buf);
        assert_eq!(entry.timestamp, u64::MAX);
        assert_eq!(entry.offset, u64::MAX);
    }
}
