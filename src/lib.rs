pub mod error;
pub mod header;
pub mod index;
pub mod payload;
pub mod io_stream;
pub mod archive;
pub mod fs;

pub use error::{ArchiveError, ArchiveResult, FormatError};
pub use header::{ArchiveHeader, decode_header};
pub use index::{IndexEntry, decode_index, encode_header_and_index};
pub use payload::{PayloadHeader, decode_payload_header, extract_raw_payload, wrap_payload};
pub use io_stream::S3pWriter;
pub use archive::{pack, unpack, RawPayload, UnpackOptions};
