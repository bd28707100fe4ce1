//! Streaming S3P writer.
//!
//! [`S3pWriter`] reserves the header and a zeroed index at offset 0, appends
//! one S3V0-framed payload per [`add_payload`](S3pWriter::add_payload) call,
//! and on [`finalize`](S3pWriter::finalize) writes the trailer sentinel and
//! patches the index in place. The patched region is byte-for-byte the same
//! size as the placeholder, so the archive length never changes after the
//! trailer is written.
//!
//! Entry offsets are absolute positions in the sink, so the sink must start
//! out empty. A sink that already holds bytes is rejected.

use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{Seek, SeekFrom, Write};

use crate::error::{ArchiveError, ArchiveResult, FormatError};
use crate::header::{ArchiveHeader, TRAILER_SENTINEL, TRAILER_SIZE};
use crate::index::{encode_header_and_index, IndexEntry};
use crate::payload::wrap_payload;

pub struct S3pWriter<W: Write + Seek> {
    writer:      W,
    entry_count: u32,
    entries:     Vec<IndexEntry>,
    /// Absolute offset of the next payload.
    position:    u64,
}

impl<W: Write + Seek> S3pWriter<W> {
    /// Start an archive holding exactly `entry_count` payloads.
    ///
    /// The sink must be empty: stale bytes would survive past the trailer.
    pub fn new(mut writer: W, entry_count: u32) -> ArchiveResult<Self> {
        let existing = writer.seek(SeekFrom::End(0))?;
        if existing != 0 {
            return Err(ArchiveError::NonEmptySink { len: existing });
        }
        let placeholder = encode_header_and_index(entry_count, &[])?; // patched on finalize
        writer.write_all(&placeholder)?;
        Ok(Self {
            writer,
            entry_count,
            entries:  Vec::with_capacity(entry_count as usize),
            position: ArchiveHeader::new(entry_count).index_end(),
        })
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Wrap `raw` and append it. Returns the index entry recorded for it.
    pub fn add_payload(&mut self, raw: &[u8]) -> ArchiveResult<IndexEntry> {
        let index = self.entries.len();
        if index >= self.entry_count as usize {
            return Err(ArchiveError::entry(index, FormatError::EntryCount {
                declared: self.entry_count,
                supplied: index + 1,
            }));
        }

        let framed = wrap_payload(raw).map_err(|e| ArchiveError::entry(index, e))?;
        let entry = IndexEntry {
            offset: fit_u32(self.position).map_err(|e| ArchiveError::entry(index, e))?,
            length: fit_u32(framed.len() as u64).map_err(|e| ArchiveError::entry(index, e))?,
        };
        // The entry's end must stay addressable too.
        fit_u32(entry.end()).map_err(|e| ArchiveError::entry(index, e))?;

        self.writer.write_all(&framed)?;
        self.position += framed.len() as u64;
        tracing::debug!(index, offset = entry.offset, length = entry.length, "payload written");
        self.entries.push(entry);
        Ok(entry)
    }

    /// Append the trailer sentinel, backpatch the index and hand the sink back.
    pub fn finalize(mut self) -> ArchiveResult<W> {
        if self.entries.len() != self.entry_count as usize {
            return Err(ArchiveError::Unfinished {
                declared: self.entry_count,
                written:  self.entries.len(),
            });
        }

        self.writer.write_u32::<LittleEndian>(TRAILER_SENTINEL)?;
        let end = self.position + TRAILER_SIZE as u64;

        let index = encode_header_and_index(self.entry_count, &self.entries)?;
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.write_all(&index)?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}

fn fit_u32(v: u64) -> Result<u32, FormatError> {
    u32::try_from(v).map_err(|_| FormatError::Oversized { len: v })
}
