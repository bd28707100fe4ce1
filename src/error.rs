use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Byte-level decoding and encoding failures.
///
/// Returned by the codec functions in [`crate::header`], [`crate::index`] and
/// [`crate::payload`]. None of them touch caller-visible state on failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("bad magic: expected \"{}\", found \"{}\"", .expected.escape_ascii(), .found.escape_ascii())]
    BadMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("truncated: {needed} bytes required, {available} available")]
    Truncated { needed: u64, available: u64 },

    #[error("payload body starts at {filestart} but the payload is only {len} bytes")]
    InvalidFilestart { filestart: u32, len: usize },

    #[error("value {len} does not fit in a 32-bit archive field")]
    Oversized { len: u64 },

    #[error("header declares {declared} entries but {supplied} were supplied")]
    EntryCount { declared: u32, supplied: usize },
}

/// Failures surfaced by the pack/unpack orchestration.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("entry {index}: {source}")]
    Entry {
        index:  usize,
        #[source]
        source: FormatError,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{}: {source}", .path.display())]
    Path {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output already holds {len} bytes; an archive must be written to an empty sink")]
    NonEmptySink { len: u64 },

    #[error("archive declared {declared} entries but {written} payloads were written")]
    Unfinished { declared: u32, written: usize },
}

impl ArchiveError {
    pub(crate) fn entry(index: usize, source: FormatError) -> Self {
        ArchiveError::Entry { index, source }
    }

    pub(crate) fn path(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ArchiveError::Path { path: path.into(), source }
    }

    /// The codec-level cause, if this error came from malformed bytes.
    pub fn format_error(&self) -> Option<&FormatError> {
        match self {
            ArchiveError::Format(e) | ArchiveError::Entry { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

pub type ArchiveResult<T> = Result<T, ArchiveError>;
