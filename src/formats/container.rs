//! CRAM containers
//!
//! Container header layout (all integers ITF-8 unless noted):
//!
//! ```text
//! length(i32 LE) reference_id alignment_start alignment_span record_count
//! record_counter(ltf8) bases(ltf8) block_count landmark_count landmarks...
//! [crc32(u32 LE), 3.x only]
//! ```
//!
//! `length` counts the body bytes that follow the header.

use crate::core::error::{ContainerError, ContainerResult};
use crate::core::io::read_bytes;
use crate::core::itf8::{read_itf8, read_ltf8, write_itf8, write_ltf8};
use crate::core::options::ValidationStringency;
use crate::formats::block::Block;
use crate::formats::crc::{crc32, CrcReader};
use crate::formats::file_header::Version;
use std::io::{self, Read, Write};

/// Alignment start written into the EOF container
pub const EOF_ALIGNMENT_START: i32 = 4_542_278;

/// Reference id of containers holding unmapped or multi-reference records
pub const UNMAPPED_REFERENCE_ID: i32 = -1;

/// Parsed container header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Body size in bytes
    pub length: i32,
    pub reference_id: i32,
    pub alignment_start: i32,
    pub alignment_span: i32,
    pub record_count: i32,
    pub record_counter: i64,
    pub bases: i64,
    pub block_count: i32,
    /// Slice offsets relative to the end of the header
    pub landmarks: Vec<i32>,
    /// Stored checksum (3.x)
    pub crc32: Option<u32>,
    /// Bytes the header itself occupies on disk
    pub header_size: usize,
}

impl ContainerHeader {
    /// Header of the end-of-file marker container
    pub fn eof() -> Self {
        Self {
            reference_id: UNMAPPED_REFERENCE_ID,
            alignment_start: EOF_ALIGNMENT_START,
            block_count: 1,
            ..Default::default()
        }
    }

    /// True for the end-of-file marker container
    pub fn is_eof(&self) -> bool {
        self.reference_id == UNMAPPED_REFERENCE_ID
            && self.alignment_start == EOF_ALIGNMENT_START
            && self.record_count == 0
    }

    /// Whether the container extends past `start`
    ///
    /// Evaluated in 64-bit arithmetic so large spans cannot wrap.
    pub fn overlaps_start(&self, start: i64) -> bool {
        self.alignment_start as i64 + self.alignment_span as i64 > start
    }

    /// Body size in bytes
    pub fn body_len(&self) -> usize {
        self.length.max(0) as usize
    }

    /// Serialize the header, appending a CRC32 on 3.x
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, version: Version) -> io::Result<usize> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&self.length.to_le_bytes());
        write_itf8(&mut buf, self.reference_id)?;
        write_itf8(&mut buf, self.alignment_start)?;
        write_itf8(&mut buf, self.alignment_span)?;
        write_itf8(&mut buf, self.record_count)?;
        write_ltf8(&mut buf, self.record_counter)?;
        write_ltf8(&mut buf, self.bases)?;
        write_itf8(&mut buf, self.block_count)?;
        write_itf8(&mut buf, self.landmarks.len() as i32)?;
        for &landmark in &self.landmarks {
            write_itf8(&mut buf, landmark)?;
        }
        if version.has_crc32() {
            let crc = crc32(&buf);
            buf.extend_from_slice(&crc.to_le_bytes());
        }
        writer.write_all(&buf)?;
        Ok(buf.len())
    }
}

/// Parses a container header from a positioned stream
///
/// Implementations consume exactly the header bytes and leave the stream
/// immediately after them.
pub trait ContainerHeaderReader {
    fn read_header(&self, reader: &mut dyn Read) -> ContainerResult<ContainerHeader>;
}

/// Container header parser for CRAM 2.x and 3.x
#[derive(Debug, Clone, Copy)]
pub struct CramHeaderReader {
    version: Version,
    stringency: ValidationStringency,
}

impl CramHeaderReader {
    pub fn new(version: Version, stringency: ValidationStringency) -> Self {
        Self { version, stringency }
    }

    pub fn version(&self) -> Version {
        self.version
    }
}

impl ContainerHeaderReader for CramHeaderReader {
    fn read_header(&self, reader: &mut dyn Read) -> ContainerResult<ContainerHeader> {
        let mut crc_reader = CrcReader::new(reader);

        let mut length_bytes = [0u8; 4];
        crc_reader.read_exact(&mut length_bytes)?;
        let length = i32::from_le_bytes(length_bytes);
        if length < 0 {
            return Err(ContainerError::NegativeLength {
                field: "container length",
                value: length as i64,
            });
        }

        let reference_id = read_itf8(&mut crc_reader)?;
        let alignment_start = read_itf8(&mut crc_reader)?;
        let alignment_span = read_itf8(&mut crc_reader)?;
        let record_count = read_itf8(&mut crc_reader)?;
        let record_counter = read_ltf8(&mut crc_reader)?;
        let bases = read_ltf8(&mut crc_reader)?;
        let block_count = read_itf8(&mut crc_reader)?;

        let landmark_count = read_itf8(&mut crc_reader)?;
        if landmark_count < 0 {
            return Err(ContainerError::NegativeLength {
                field: "landmark count",
                value: landmark_count as i64,
            });
        }
        let mut landmarks = Vec::with_capacity(landmark_count.min(1024) as usize);
        for _ in 0..landmark_count {
            landmarks.push(read_itf8(&mut crc_reader)?);
        }

        let mut header_size = crc_reader.amount();
        let crc32 = if self.version.has_crc32() {
            let computed = crc_reader.sum();
            let stored = crc_reader.read_stored_crc()?;
            header_size += 4;
            if stored != computed {
                self.stringency.check(ContainerError::ChecksumMismatch {
                    what: "container header",
                    stored,
                    computed,
                })?;
            }
            Some(stored)
        } else {
            None
        };

        Ok(ContainerHeader {
            length,
            reference_id,
            alignment_start,
            alignment_span,
            record_count,
            record_counter,
            bases,
            block_count,
            landmarks,
            crc32,
            header_size,
        })
    }
}

/// A whole container: where it sits, its header and its undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    /// Byte offset of the container header in the file
    pub offset: u64,
    pub header: ContainerHeader,
    pub body: Vec<u8>,
    pub version: Version,
}

impl Container {
    /// Read header and body from a stream positioned at `offset`
    pub fn read_from<R: Read>(
        reader: &mut R,
        offset: u64,
        headers: &CramHeaderReader,
    ) -> ContainerResult<Self> {
        let header = headers.read_header(reader)?;
        let body = read_bytes(reader, header.body_len())?;
        Ok(Self {
            offset,
            header,
            body,
            version: headers.version(),
        })
    }

    /// Parse the body into its blocks
    pub fn blocks(&self, stringency: ValidationStringency) -> ContainerResult<Vec<Block>> {
        let mut cursor = io::Cursor::new(&self.body[..]);
        let count = self.header.block_count.max(0) as usize;
        let mut blocks = Vec::with_capacity(count.min(self.body.len()));
        for _ in 0..count {
            blocks.push(Block::read_from(&mut cursor, self.version, stringency)?);
        }
        Ok(blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::block::ContentType;
    use std::io::Cursor;

    const V3: Version = Version::new(3, 0);
    const V2: Version = Version::new(2, 1);

    fn sample_header() -> ContainerHeader {
        ContainerHeader {
            length: 0,
            reference_id: 0,
            alignment_start: 1000,
            alignment_span: 500,
            record_count: 12,
            record_counter: 300,
            bases: 1200,
            block_count: 0,
            landmarks: vec![0, 150],
            ..Default::default()
        }
    }

    #[test]
    fn test_header_round_trip_v3() {
        let header = sample_header();
        let mut buf = Vec::new();
        let written = header.write_to(&mut buf, V3).unwrap();

        let reader = CramHeaderReader::new(V3, ValidationStringency::Strict);
        let mut cursor = Cursor::new(&buf);
        let parsed = reader.read_header(&mut cursor).unwrap();

        assert_eq!(parsed.alignment_start, 1000);
        assert_eq!(parsed.alignment_span, 500);
        assert_eq!(parsed.landmarks, vec![0, 150]);
        assert_eq!(parsed.header_size, written);
        assert!(parsed.crc32.is_some());
        assert_eq!(cursor.position() as usize, buf.len());
    }

    #[test]
    fn test_header_v2_has_no_crc() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf, V2).unwrap();

        let reader = CramHeaderReader::new(V2, ValidationStringency::Strict);
        let parsed = reader.read_header(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(parsed.crc32, None);
        assert_eq!(parsed.header_size, buf.len());
    }

    #[test]
    fn test_header_crc_mismatch() {
        let mut buf = Vec::new();
        sample_header().write_to(&mut buf, V3).unwrap();
        buf[5] ^= 0x01;

        let strict = CramHeaderReader::new(V3, ValidationStringency::Strict);
        assert!(matches!(
            strict.read_header(&mut Cursor::new(&buf)),
            Err(ContainerError::ChecksumMismatch { .. })
        ));

        let silent = CramHeaderReader::new(V3, ValidationStringency::Silent);
        assert!(silent.read_header(&mut Cursor::new(&buf)).is_ok());
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut buf = Vec::new();
        ContainerHeader {
            length: -5,
            ..sample_header()
        }
        .write_to(&mut buf, V3)
        .unwrap();

        let reader = CramHeaderReader::new(V3, ValidationStringency::Lenient);
        assert!(matches!(
            reader.read_header(&mut Cursor::new(&buf)),
            Err(ContainerError::NegativeLength { .. })
        ));
    }

    #[test]
    fn test_eof_container() {
        let eof = ContainerHeader::eof();
        assert!(eof.is_eof());
        assert!(!sample_header().is_eof());
    }

    #[test]
    fn test_overlaps_start() {
        let header = sample_header();
        assert!(header.overlaps_start(1499));
        assert!(!header.overlaps_start(1500));
        assert!(header.overlaps_start(0));

        let wide = ContainerHeader {
            alignment_start: i32::MAX,
            alignment_span: i32::MAX,
            ..Default::default()
        };
        assert!(wide.overlaps_start(i32::MAX as i64));
    }

    #[test]
    fn test_container_blocks() {
        let block = Block::raw(ContentType::CompressionHeader, 0, vec![9, 9]);
        let mut body = Vec::new();
        block.write_to(&mut body, V3).unwrap();

        let header = ContainerHeader {
            length: body.len() as i32,
            block_count: 1,
            ..sample_header()
        };
        let mut buf = Vec::new();
        header.write_to(&mut buf, V3).unwrap();
        buf.extend_from_slice(&body);

        let headers = CramHeaderReader::new(V3, ValidationStringency::Strict);
        let container = Container::read_from(&mut Cursor::new(&buf), 40, &headers).unwrap();
        assert_eq!(container.offset, 40);
        assert_eq!(container.header.header_size + container.body.len(), buf.len());

        let blocks = container.blocks(ValidationStringency::Strict).unwrap();
        assert_eq!(blocks, vec![block]);
    }
}
