//! S3P archive header: `magic[4] = "S3P0"`, `entry_count: u32` (LE).
//!
//! The header is always exactly [`HEADER_SIZE`] bytes regardless of how many
//! entries follow it. The index table starts immediately afterwards.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

pub const MAGIC: &[u8; 4] = b"S3P0";
pub const HEADER_SIZE: usize = 8;

/// Written once after the last payload. Never interpreted on read.
pub const TRAILER_SENTINEL: u32 = 0x1234_5678;
pub const TRAILER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveHeader {
    pub magic:       [u8; 4],
    pub entry_count: u32,
}

impl ArchiveHeader {
    pub fn new(entry_count: u32) -> Self {
        Self { magic: *MAGIC, entry_count }
    }

    /// Bytes occupied by the header plus its index table.
    pub fn index_end(&self) -> u64 {
        HEADER_SIZE as u64 + self.entry_count as u64 * crate::index::ENTRY_SIZE as u64
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut out[4..8], self.entry_count);
        out
    }
}

/// Decode the fixed-size header prefix of `bytes`.
///
/// Consumes exactly [`HEADER_SIZE`] bytes; anything after is ignored.
pub fn decode_header(bytes: &[u8]) -> Result<ArchiveHeader, FormatError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FormatError::Truncated {
            needed:    HEADER_SIZE as u64,
            available: bytes.len() as u64,
        });
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[..4]);
    if &magic != MAGIC {
        return Err(FormatError::BadMagic { expected: *MAGIC, found: magic });
    }
    Ok(ArchiveHeader {
        magic,
        entry_count: LittleEndian::read_u32(&bytes[4..HEADER_SIZE]),
    })
}

/// True when the last four bytes of `archive` are the trailer sentinel.
pub fn has_trailer(archive: &[u8]) -> bool {
    trailer_bytes(archive)
        .map(|t| LittleEndian::read_u32(t) == TRAILER_SENTINEL)
        .unwrap_or(false)
}

pub(crate) fn trailer_bytes(archive: &[u8]) -> Option<&[u8]> {
    archive.len()
        .checked_sub(TRAILER_SIZE)
        .filter(|&start| start >= HEADER_SIZE)
        .map(|start| &archive[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_magic_and_little_endian_count() {
        let bytes = ArchiveHeader::new(0x0102_0304).to_bytes();
        assert_eq!(&bytes, b"S3P0\x04\x03\x02\x01");
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let mut bytes = ArchiveHeader::new(3).to_bytes().to_vec();
        bytes.extend_from_slice(&[0xAA; 100]);
        let h = decode_header(&bytes).unwrap();
        assert_eq!(h.entry_count, 3);
        assert_eq!(h.index_end(), 8 + 3 * 8);
    }

    #[test]
    fn rejects_foreign_magic() {
        let err = decode_header(b"S3V0\0\0\0\0").unwrap_err();
        assert_eq!(err, FormatError::BadMagic { expected: *b"S3P0", found: *b"S3V0" });
    }

    #[test]
    fn short_header_is_truncated() {
        let err = decode_header(b"S3P0\x01").unwrap_err();
        assert_eq!(err, FormatError::Truncated { needed: 8, available: 5 });
    }

    #[test]
    fn to_bytes_decodes_back() {
        let h = ArchiveHeader::new(7);
        assert_eq!(decode_header(&h.to_bytes()).unwrap(), h);
    }

    #[test]
    fn trailer_detection() {
        let mut bytes = ArchiveHeader::new(0).to_bytes().to_vec();
        assert!(!has_trailer(&bytes));
        bytes.extend_from_slice(&TRAILER_SENTINEL.to_le_bytes());
        assert!(has_trailer(&bytes));
    }
}
