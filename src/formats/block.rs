//! CRAM blocks
//!
//! A block is the unit of compressed data inside a container:
//!
//! ```text
//! method(u8) content_type(u8) content_id(itf8) compressed_size(itf8)
//! raw_size(itf8) data[compressed_size] [crc32(u32 LE), 3.x only]
//! ```

use crate::core::error::{ContainerError, ContainerResult};
use crate::core::io::read_bytes;
use crate::core::itf8::{read_itf8, write_itf8};
use crate::core::options::ValidationStringency;
use crate::formats::crc::{crc32, CrcReader};
use crate::formats::file_header::Version;
use std::borrow::Cow;
use std::io::{self, Read, Write};

/// Block compression method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Raw,
    Gzip,
    Bzip2,
    /// Codecs decoded elsewhere (lzma, rANS, ...)
    Other(u8),
}

impl CompressionMethod {
    pub fn code(self) -> u8 {
        match self {
            CompressionMethod::Raw => 0,
            CompressionMethod::Gzip => 1,
            CompressionMethod::Bzip2 => 2,
            CompressionMethod::Other(code) => code,
        }
    }
}

impl From<u8> for CompressionMethod {
    fn from(code: u8) -> Self {
        match code {
            0 => CompressionMethod::Raw,
            1 => CompressionMethod::Gzip,
            2 => CompressionMethod::Bzip2,
            other => CompressionMethod::Other(other),
        }
    }
}

/// What a block carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    FileHeader,
    CompressionHeader,
    SliceHeader,
    Reserved,
    ExternalData,
    CoreData,
    Other(u8),
}

impl ContentType {
    pub fn code(self) -> u8 {
        match self {
            ContentType::FileHeader => 0,
            ContentType::CompressionHeader => 1,
            ContentType::SliceHeader => 2,
            ContentType::Reserved => 3,
            ContentType::ExternalData => 4,
            ContentType::CoreData => 5,
            ContentType::Other(code) => code,
        }
    }
}

impl From<u8> for ContentType {
    fn from(code: u8) -> Self {
        match code {
            0 => ContentType::FileHeader,
            1 => ContentType::CompressionHeader,
            2 => ContentType::SliceHeader,
            3 => ContentType::Reserved,
            4 => ContentType::ExternalData,
            5 => ContentType::CoreData,
            other => ContentType::Other(other),
        }
    }
}

/// One block as stored on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub method: CompressionMethod,
    pub content_type: ContentType,
    pub content_id: i32,
    /// Size after decompression
    pub raw_size: usize,
    /// Stored (possibly compressed) bytes
    pub data: Vec<u8>,
}

fn non_negative(field: &'static str, value: i32) -> ContainerResult<usize> {
    usize::try_from(value).map_err(|_| ContainerError::NegativeLength {
        field,
        value: value as i64,
    })
}

impl Block {
    /// Uncompressed block
    pub fn raw(content_type: ContentType, content_id: i32, data: Vec<u8>) -> Self {
        Self {
            method: CompressionMethod::Raw,
            content_type,
            content_id,
            raw_size: data.len(),
            data,
        }
    }

    /// Parse one block, verifying its CRC32 on 3.x files
    pub fn read_from<R: Read + ?Sized>(
        reader: &mut R,
        version: Version,
        stringency: ValidationStringency,
    ) -> ContainerResult<Self> {
        let mut crc_reader = CrcReader::new(reader);

        let mut prefix = [0u8; 2];
        crc_reader.read_exact(&mut prefix)?;
        let content_id = read_itf8(&mut crc_reader)?;
        let compressed_size = non_negative("block compressed size", read_itf8(&mut crc_reader)?)?;
        let raw_size = non_negative("block raw size", read_itf8(&mut crc_reader)?)?;

        let data = read_bytes(&mut crc_reader, compressed_size)?;

        if version.has_crc32() {
            let computed = crc_reader.sum();
            let stored = crc_reader.read_stored_crc()?;
            if stored != computed {
                stringency.check(ContainerError::ChecksumMismatch {
                    what: "block",
                    stored,
                    computed,
                })?;
            }
        }

        Ok(Self {
            method: CompressionMethod::from(prefix[0]),
            content_type: ContentType::from(prefix[1]),
            content_id,
            raw_size,
            data,
        })
    }

    /// Serialize the block, appending a CRC32 on 3.x
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W, version: Version) -> io::Result<usize> {
        let mut buf = Vec::with_capacity(self.data.len() + 16);
        buf.push(self.method.code());
        buf.push(self.content_type.code());
        write_itf8(&mut buf, self.content_id)?;
        write_itf8(&mut buf, self.data.len() as i32)?;
        write_itf8(&mut buf, self.raw_size as i32)?;
        buf.extend_from_slice(&self.data);
        if version.has_crc32() {
            let crc = crc32(&buf);
            buf.extend_from_slice(&crc.to_le_bytes());
        }
        writer.write_all(&buf)?;
        Ok(buf.len())
    }

    /// Block payload after decompression
    pub fn decompressed(&self) -> ContainerResult<Cow<'_, [u8]>> {
        match self.method {
            CompressionMethod::Raw => Ok(Cow::Borrowed(&self.data)),
            CompressionMethod::Gzip => {
                let mut out = Vec::new();
                flate2::read::MultiGzDecoder::new(&self.data[..])
                    .take(self.raw_size as u64)
                    .read_to_end(&mut out)?;
                Ok(Cow::Owned(out))
            }
            CompressionMethod::Bzip2 => {
                let mut out = Vec::new();
                bzip2::read::BzDecoder::new(&self.data[..])
                    .take(self.raw_size as u64)
                    .read_to_end(&mut out)?;
                Ok(Cow::Owned(out))
            }
            CompressionMethod::Other(code) => Err(ContainerError::UnsupportedCompression(code)),
        }
    }
}
