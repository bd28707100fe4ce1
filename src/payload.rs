//! S3V0 payload frame: the fixed 64-byte sub-header that wraps every raw
//! audio buffer stored in an archive.
//!
//! ```text
//! 0   magic[4]      "S3V0"
//! 4   filestart:u32 body offset from the start of the frame
//! 8   length:u32    raw body length
//! 12  reserved[52]  opaque, zero on write, preserved on read
//! 64  body
//! ```
//!
//! Readers must honour the stored `filestart`: archives written by other
//! tools place the body at 32.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

pub const PAYLOAD_MAGIC: &[u8; 4] = b"S3V0";
pub const PAYLOAD_HEADER_SIZE: usize = 64;
pub const RESERVED_SIZE: usize = PAYLOAD_HEADER_SIZE - 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadHeader {
    pub magic:     [u8; 4],
    pub filestart: u32,
    pub length:    u32,
    pub reserved:  [u8; RESERVED_SIZE],
}

impl PayloadHeader {
    /// Header for a freshly wrapped body of `length` bytes.
    pub fn new(length: u32) -> Self {
        Self {
            magic:     *PAYLOAD_MAGIC,
            filestart: PAYLOAD_HEADER_SIZE as u32,
            length,
            reserved:  [0u8; RESERVED_SIZE],
        }
    }

    pub fn to_bytes(&self) -> [u8; PAYLOAD_HEADER_SIZE] {
        let mut out = [0u8; PAYLOAD_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        LittleEndian::write_u32(&mut out[4..8], self.filestart);
        LittleEndian::write_u32(&mut out[8..12], self.length);
        out[12..].copy_from_slice(&self.reserved);
        out
    }
}

/// Decode the sub-header at the start of an entry's slice.
pub fn decode_payload_header(slice: &[u8]) -> Result<PayloadHeader, FormatError> {
    if slice.len() < PAYLOAD_HEADER_SIZE {
        return Err(FormatError::Truncated {
            needed:    PAYLOAD_HEADER_SIZE as u64,
            available: slice.len() as u64,
        });
    }
    let mut magic = [0u8; 4];
    magic.copy_from_slice(&slice[0..4]);
    if &magic != PAYLOAD_MAGIC {
        return Err(FormatError::BadMagic { expected: *PAYLOAD_MAGIC, found: magic });
    }
    let mut reserved = [0u8; RESERVED_SIZE];
    reserved.copy_from_slice(&slice[12..PAYLOAD_HEADER_SIZE]);
    Ok(PayloadHeader {
        magic,
        filestart: LittleEndian::read_u32(&slice[4..8]),
        length:    LittleEndian::read_u32(&slice[8..12]),
        reserved,
    })
}

/// The raw body: `slice[filestart..]`.
pub fn extract_raw_payload<'a>(
    header: &PayloadHeader,
    slice:  &'a [u8],
) -> Result<&'a [u8], FormatError> {
    let start = header.filestart as usize;
    if start > slice.len() {
        return Err(FormatError::InvalidFilestart {
            filestart: header.filestart,
            len:       slice.len(),
        });
    }
    let body = &slice[start..];
    if body.len() as u64 != header.length as u64 {
        tracing::debug!(
            declared = header.length,
            actual = body.len(),
            "payload length field disagrees with body size"
        );
    }
    Ok(body)
}

/// Frame `raw` as an S3V0 payload: 64-byte header followed by `raw` verbatim.
pub fn wrap_payload(raw: &[u8]) -> Result<Vec<u8>, FormatError> {
    let length = u32::try_from(raw.len())
        .map_err(|_| FormatError::Oversized { len: raw.len() as u64 })?;
    let mut out = Vec::with_capacity(PAYLOAD_HEADER_SIZE + raw.len());
    out.extend_from_slice(&PayloadHeader::new(length).to_bytes());
    out.extend_from_slice(raw);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_layout() {
        let framed = wrap_payload(b"0123456789").unwrap();
        assert_eq!(framed.len(), 74);
        assert_eq!(&framed[0..4], b"S3V0");
        assert_eq!(&framed[4..8], &64u32.to_le_bytes());
        assert_eq!(&framed[8..12], &10u32.to_le_bytes());
        assert!(framed[12..64].iter().all(|&b| b == 0));
        assert_eq!(&framed[64..], b"0123456789");
    }

    #[test]
    fn unwrap_returns_body() {
        let framed = wrap_payload(b"audio").unwrap();
        let header = decode_payload_header(&framed).unwrap();
        assert_eq!(header, PayloadHeader::new(5));
        assert_eq!(extract_raw_payload(&header, &framed).unwrap(), b"audio");
    }

    #[test]
    fn empty_body_wraps_to_bare_header() {
        let framed = wrap_payload(&[]).unwrap();
        assert_eq!(framed.len(), PAYLOAD_HEADER_SIZE);
        let header = decode_payload_header(&framed).unwrap();
        assert!(extract_raw_payload(&header, &framed).unwrap().is_empty());
    }

    #[test]
    fn honours_nondefault_filestart_and_keeps_reserved() {
        let mut framed = wrap_payload(&[0xEE; 40]).unwrap();
        framed[4..8].copy_from_slice(&32u32.to_le_bytes());
        framed[20] = 0x5A;
        let header = decode_payload_header(&framed).unwrap();
        assert_eq!(header.filestart, 32);
        assert_eq!(header.reserved[8], 0x5A);
        assert_eq!(header.to_bytes()[..], framed[..64]);
        assert_eq!(extract_raw_payload(&header, &framed).unwrap().len(), 72);
    }

    #[test]
    fn rejects_foreign_magic() {
        let mut framed = wrap_payload(b"x").unwrap();
        framed[..4].copy_from_slice(b"S3P0");
        assert_eq!(
            decode_payload_header(&framed).unwrap_err(),
            FormatError::BadMagic { expected: *b"S3V0", found: *b"S3P0" },
        );
    }

    #[test]
    fn short_slice_is_truncated() {
        let framed = wrap_payload(b"").unwrap();
        assert_eq!(
            decode_payload_header(&framed[..63]).unwrap_err(),
            FormatError::Truncated { needed: 64, available: 63 },
        );
    }

    #[test]
    fn filestart_past_slice_is_rejected() {
        let framed = wrap_payload(b"abc").unwrap();
        let mut header = decode_payload_header(&framed).unwrap();
        header.filestart = 68;
        assert_eq!(
            extract_raw_payload(&header, &framed).unwrap_err(),
            FormatError::InvalidFilestart { filestart: 68, len: 67 },
        );

        // Exactly at the end is an empty body, not an error.
        header.filestart = 67;
        assert!(extract_raw_payload(&header, &framed).unwrap().is_empty());
    }
}
