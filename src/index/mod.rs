//! The index table: `entry_count` × `{ offset: u32, length: u32 }` (LE),
//! stored contiguously right after the archive header.
//!
//! # Backpatching
//! A writer emits the header and a zeroed index first, appends every
//! payload, then rewrites the header and index in place once real offsets
//! are known. [`encode_header_and_index`] always produces
//! `HEADER_SIZE + entry_count * ENTRY_SIZE` bytes for a given count, so the
//! second write covers exactly the bytes of the first.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::FormatError;
use crate::header::{ArchiveHeader, HEADER_SIZE};

pub const ENTRY_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndexEntry {
    /// Absolute archive position of the wrapped payload (sub-header included).
    pub offset: u32,
    /// Wrapped payload length, sub-header included.
    pub length: u32,
}

impl IndexEntry {
    pub const PLACEHOLDER: IndexEntry = IndexEntry { offset: 0, length: 0 };

    /// One past the last byte of the wrapped payload. Computed in u64 so it
    /// cannot wrap.
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.length as u64
    }

    /// Borrow this entry's bytes out of the full archive buffer.
    pub fn slice<'a>(&self, archive: &'a [u8]) -> Result<&'a [u8], FormatError> {
        let end = self.end();
        if end > archive.len() as u64 {
            return Err(FormatError::Truncated {
                needed:    end,
                available: archive.len() as u64,
            });
        }
        Ok(&archive[self.offset as usize..end as usize])
    }

    fn encode_into(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.offset);
        LittleEndian::write_u32(&mut out[4..8], self.length);
    }

    fn decode_from(bytes: &[u8]) -> Self {
        Self {
            offset: LittleEndian::read_u32(&bytes[0..4]),
            length: LittleEndian::read_u32(&bytes[4..8]),
        }
    }
}

/// Read `entry_count` records from `archive`, starting right after the header.
///
/// `archive` is the whole archive buffer (header included).
pub fn decode_index(archive: &[u8], entry_count: u32) -> Result<Vec<IndexEntry>, FormatError> {
    let needed = ArchiveHeader::new(entry_count).index_end();
    if (archive.len() as u64) < needed {
        return Err(FormatError::Truncated { needed, available: archive.len() as u64 });
    }
    let table = &archive[HEADER_SIZE..needed as usize];
    Ok(table.chunks_exact(ENTRY_SIZE).map(IndexEntry::decode_from).collect())
}

/// Serialize the header followed by exactly `entry_count` index records.
///
/// Records missing from `entries` are written as placeholders, so
/// `encode_header_and_index(n, &[])` reserves the space that a later call
/// with the real entries overwrites.
pub fn encode_header_and_index(
    entry_count: u32,
    entries:     &[IndexEntry],
) -> Result<Vec<u8>, FormatError> {
    if entries.len() > entry_count as usize {
        return Err(FormatError::EntryCount { declared: entry_count, supplied: entries.len() });
    }
    let header = ArchiveHeader::new(entry_count);
    let mut out = vec![0u8; header.index_end() as usize];
    out[..HEADER_SIZE].copy_from_slice(&header.to_bytes());

    // Trailing records stay zeroed.
    for (entry, slot) in entries.iter().zip(out[HEADER_SIZE..].chunks_exact_mut(ENTRY_SIZE)) {
        entry.encode_into(slot);
    }
    Ok(out)
}
