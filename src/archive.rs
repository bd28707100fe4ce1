//! Pack/unpack orchestration over the byte-level codec.
//!
//! ```no_run
//! use s3pkit::archive::{pack, unpack};
//!
//! let archive = pack(&[b"first".as_slice(), b"second".as_slice()])?;
//! let payloads = unpack(&archive)?;
//! assert_eq!(payloads[1].data, b"second");
//! # Ok::<(), s3pkit::ArchiveError>(())
//! ```
//!
//! Unpacking is all-or-nothing: every entry is validated before any caller
//! sees a payload, and the first bad entry aborts the pass with its index.

use std::ffi::OsString;
use std::io::{self, BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ArchiveError, ArchiveResult, FormatError};
use crate::fs;
use crate::header::{decode_header, has_trailer, trailer_bytes, ArchiveHeader};
use crate::index::{decode_index, IndexEntry};
use crate::io_stream::S3pWriter;
use crate::payload::{decode_payload_header, extract_raw_payload};

// ── UnpackOptions ────────────────────────────────────────────────────────────

/// Output layout for [`unpack_archive`].
#[derive(Debug, Clone)]
pub struct UnpackOptions {
    /// Appended to the archive path to name the output directory.
    pub dir_suffix: String,
    /// Extension of each extracted payload, without the dot.
    pub extension:  String,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            dir_suffix: ".out".into(),
            extension:  "wma".into(),
        }
    }
}

impl UnpackOptions {
    /// `<archive><dir_suffix>`, next to the archive.
    pub fn output_dir(&self, archive: &Path) -> PathBuf {
        let mut name = OsString::from(archive.as_os_str());
        name.push(&self.dir_suffix);
        PathBuf::from(name)
    }
}

// ── RawPayload ───────────────────────────────────────────────────────────────

/// One unwrapped payload, borrowed from the archive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPayload<'a> {
    /// Position in the index; also names the output file.
    pub index: usize,
    pub data:  &'a [u8],
}

impl RawPayload<'_> {
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.index, extension)
    }
}

// ── In-memory API ────────────────────────────────────────────────────────────

/// Decode the header and index table of `archive`.
pub fn read_index(archive: &[u8]) -> ArchiveResult<(ArchiveHeader, Vec<IndexEntry>)> {
    let header = decode_header(archive)?;
    let entries = decode_index(archive, header.entry_count)?;
    Ok((header, entries))
}

/// Validate one entry and return its raw body.
pub fn unpack_entry<'a>(archive: &'a [u8], entry: &IndexEntry) -> Result<&'a [u8], FormatError> {
    let slice = entry.slice(archive)?;
    let header = decode_payload_header(slice)?;
    extract_raw_payload(&header, slice)
}

/// Unwrap every payload in index order.
pub fn unpack<'a>(archive: &'a [u8]) -> ArchiveResult<Vec<RawPayload<'a>>> {
    let (_, entries) = read_index(archive)?;
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| -> ArchiveResult<RawPayload<'a>> {
            let data = unpack_entry(archive, entry).map_err(|e| ArchiveError::entry(index, e))?;
            tracing::debug!(index, offset = entry.offset, raw_len = data.len(), "payload unwrapped");
            Ok(RawPayload { index, data })
        })
        .collect()
}

/// Build a complete archive from `inputs`, in order.
pub fn pack<I: AsRef<[u8]>>(inputs: &[I]) -> ArchiveResult<Vec<u8>> {
    let mut writer = S3pWriter::new(Cursor::new(Vec::new()), entry_count(inputs.len())?)?;
    for raw in inputs {
        writer.add_payload(raw.as_ref())?;
    }
    Ok(writer.finalize()?.into_inner())
}

fn entry_count(n: usize) -> Result<u32, FormatError> {
    u32::try_from(n).map_err(|_| FormatError::Oversized { len: n as u64 })
}

// ── Inspection ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct EntryListing {
    pub index:      usize,
    pub offset:     u32,
    pub length:     u32,
    pub filestart:  u32,
    pub raw_length: usize,
    pub crc32:      u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveListing {
    pub entry_count:     u32,
    pub file_size:       u64,
    pub trailer_present: bool,
    /// Last four bytes of the file, hex encoded.
    pub trailer_hex:     Option<String>,
    pub entries:         Vec<EntryListing>,
}

/// Decode and validate every entry without copying any payload.
pub fn inspect(archive: &[u8]) -> ArchiveResult<ArchiveListing> {
    let (header, entries) = read_index(archive)?;
    let mut listing = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let describe = || -> Result<EntryListing, FormatError> {
            let slice = entry.slice(archive)?;
            let payload = decode_payload_header(slice)?;
            let raw = extract_raw_payload(&payload, slice)?;
            Ok(EntryListing {
                index,
                offset:     entry.offset,
                length:     entry.length,
                filestart:  payload.filestart,
                raw_length: raw.len(),
                crc32:      crc32fast::hash(raw),
            })
        };
        listing.push(describe().map_err(|e| ArchiveError::entry(index, e))?);
    }

    Ok(ArchiveListing {
        entry_count:     header.entry_count,
        file_size:       archive.len() as u64,
        trailer_present: has_trailer(archive),
        trailer_hex:     trailer_bytes(archive).map(hex::encode),
        entries:         listing,
    })
}

// ── File-backed API ──────────────────────────────────────────────────────────

/// Pack `inputs` into a new archive at `output`, reading one input at a time.
///
/// Refuses to run when `output` is one of the inputs. On failure the
/// partially written output is removed.
pub fn pack_files(output: &Path, inputs: &[PathBuf]) -> ArchiveResult<Vec<IndexEntry>> {
    let count = entry_count(inputs.len())?;
    if output.exists() && inputs.iter().any(|input| fs::same_file(output, input)) {
        return Err(ArchiveError::path(output, io::Error::new(
            io::ErrorKind::InvalidInput,
            "output is also listed as an input",
        )));
    }
    let file = fs::create_file(output)?;
    let result = write_archive(BufWriter::new(file), count, inputs).map_err(|e| match e {
        ArchiveError::Io(source) => ArchiveError::path(output, source),
        other => other,
    });
    if result.is_err() {
        fs::discard_file(output);
    }
    result
}

fn write_archive<W: Write + Seek>(
    sink:   W,
    count:  u32,
    inputs: &[PathBuf],
) -> ArchiveResult<Vec<IndexEntry>> {
    let mut writer = S3pWriter::new(sink, count)?;
    for path in inputs {
        let raw = fs::read_file(path)?;
        writer.add_payload(&raw)?;
        tracing::info!(input = %path.display(), bytes = raw.len(), "packed");
    }

    let entries = writer.entries().to_vec();
    writer.finalize()?;
    Ok(entries)
}

/// What [`unpack_archive`] wrote.
#[derive(Debug, Clone)]
pub struct UnpackReport {
    pub output_dir: PathBuf,
    pub files:      Vec<PathBuf>,
}

/// Unpack `archive` into `<archive><dir_suffix>/<i>.<extension>`.
///
/// The whole archive is validated before the output directory is touched,
/// so a corrupt archive leaves nothing behind.
pub fn unpack_archive(archive: &Path, opts: &UnpackOptions) -> ArchiveResult<UnpackReport> {
    let bytes = fs::read_file(archive)?;
    let payloads = unpack(&bytes)?;

    let output_dir = opts.output_dir(archive);
    fs::create_directory(&output_dir)?;

    let mut files = Vec::with_capacity(payloads.len());
    for payload in &payloads {
        let path = output_dir.join(payload.file_name(&opts.extension));
        fs::write_file(&path, payload.data)?;
        tracing::debug!(path = %path.display(), bytes = payload.data.len(), "extracted");
        files.push(path);
    }

    tracing::info!(
        archive = %archive.display(),
        entries = files.len(),
        "unpacked"
    );
    Ok(UnpackReport { output_dir, files })
}

// ── Batches ──────────────────────────────────────────────────────────────────

/// Outcome of running one operation over several archives.
#[derive(Debug)]
pub struct Batch<T> {
    pub done:   Vec<(PathBuf, T)>,
    pub failed: Vec<(PathBuf, ArchiveError)>,
}

impl<T> Batch<T> {
    /// At least one archive was processed successfully.
    pub fn usable(&self) -> bool {
        !self.done.is_empty()
    }
}

/// Run `op` on every archive in order. A failure is logged and recorded;
/// it never stops the remaining archives.
pub fn for_each_archive<T, F>(inputs: &[PathBuf], mut op: F) -> Batch<T>
where
    F: FnMut(&Path) -> ArchiveResult<T>,
{
    let mut batch = Batch { done: Vec::new(), failed: Vec::new() };
    for path in inputs {
        match op(path) {
            Ok(v) => batch.done.push((path.clone(), v)),
            Err(e) => {
                tracing::error!(archive = %path.display(), "{e}");
                batch.failed.push((path.clone(), e));
            }
        }
    }
    batch
}

/// [`unpack_archive`] over each of `inputs`.
pub fn unpack_all(inputs: &[PathBuf], opts: &UnpackOptions) -> Batch<UnpackReport> {
    for_each_archive(inputs, |path| unpack_archive(path, opts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_input_scenario() {
        let archive = pack(&[vec![0xA1u8; 10], vec![0xB2u8; 20]]).unwrap();
        let (header, entries) = read_index(&archive).unwrap();
        assert_eq!(header.entry_count, 2);
        assert_eq!(entries[0].length, 74);
        assert_eq!(entries[1].length, 84);
        assert!(has_trailer(&archive));

        let out = unpack(&archive).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].data, &[0xA1u8; 10][..]);
        assert_eq!(out[1].data, &[0xB2u8; 20][..]);
    }

    #[test]
    fn empty_archive_unpacks_to_nothing() {
        let archive = pack::<Vec<u8>>(&[]).unwrap();
        assert_eq!(archive.len(), 8 + 4);
        assert!(unpack(&archive).unwrap().is_empty());
    }

    #[test]
    fn corrupt_entry_magic_reports_index() {
        let mut archive = pack(&[b"aa".as_slice(), b"bb".as_slice()]).unwrap();
        let (_, entries) = read_index(&archive).unwrap();
        archive[entries[1].offset as usize] = b'X';

        let err = unpack(&archive).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::Entry { index: 1, source: FormatError::BadMagic { .. } }
        ));
    }

    #[test]
    fn entry_past_end_of_file_is_truncated() {
        let mut archive = pack(&[b"payload".as_slice()]).unwrap();
        archive[12..16].copy_from_slice(&10_000u32.to_le_bytes());
        assert!(matches!(
            unpack(&archive).unwrap_err(),
            ArchiveError::Entry { index: 0, source: FormatError::Truncated { .. } }
        ));
    }

    #[test]
    fn inspect_reports_crc_and_trailer() {
        let archive = pack(&[b"hello".as_slice()]).unwrap();
        let listing = inspect(&archive).unwrap();
        assert_eq!(listing.entry_count, 1);
        assert!(listing.trailer_present);
        assert_eq!(listing.trailer_hex.as_deref(), Some("78563412"));
        assert_eq!(listing.entries[0].filestart, 64);
        assert_eq!(listing.entries[0].raw_length, 5);
        assert_eq!(listing.entries[0].crc32, crc32fast::hash(b"hello"));
    }

    #[test]
    fn output_dir_is_a_sibling_with_suffix() {
        let opts = UnpackOptions::default();
        assert_eq!(opts.output_dir(Path::new("music/bgm.s3p")), PathBuf::from("music/bgm.s3p.out"));
        let p = RawPayload { index: 3, data: &[] };
        assert_eq!(p.file_name(&opts.extension), "3.wma");
    }
}
