//! CRAM file definition and SAM header
//!
//! Every CRAM file opens with a 26-byte file definition (`CRAM`, major
//! version, minor version, 20-byte file id) followed by a header container
//! whose first block holds the SAM header text, prefixed by its length as a
//! little-endian `i32`. The text itself is parsed with `noodles::sam`.

use crate::core::error::{ContainerError, ContainerResult};
use crate::core::io::{read_bytes, read_magic};
use crate::core::options::ValidationStringency;
use crate::formats::block::{Block, ContentType};
use crate::formats::container::{ContainerHeader, ContainerHeaderReader, CramHeaderReader};
use noodles::sam;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::Path;

/// Magic bytes at offset 0 of every CRAM file
pub const CRAM_MAGIC: &[u8; 4] = b"CRAM";

/// Size of the file definition in bytes
pub const FILE_DEFINITION_LEN: usize = 26;

/// CRAM format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Containers and blocks carry CRC32 trailers from 3.0 on
    pub const fn has_crc32(self) -> bool {
        self.major >= 3
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The fixed-size prologue of a CRAM file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDefinition {
    pub version: Version,
    pub file_id: [u8; 20],
}

impl FileDefinition {
    pub fn new(version: Version) -> Self {
        Self {
            version,
            file_id: [0u8; 20],
        }
    }

    /// Parse and validate the file definition
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> ContainerResult<Self> {
        let mut buf = [0u8; FILE_DEFINITION_LEN];
        reader.read_exact(&mut buf)?;

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&buf[..4]);
        if &magic != CRAM_MAGIC {
            return Err(ContainerError::InvalidMagic(magic));
        }

        let version = Version::new(buf[4], buf[5]);
        if !(2..=3).contains(&version.major) {
            return Err(ContainerError::UnsupportedVersion {
                major: version.major,
                minor: version.minor,
            });
        }

        let mut file_id = [0u8; 20];
        file_id.copy_from_slice(&buf[6..]);
        Ok(Self { version, file_id })
    }

    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(CRAM_MAGIC)?;
        writer.write_all(&[self.version.major, self.version.minor])?;
        writer.write_all(&self.file_id)
    }
}

/// Parse SAM header text, ignoring trailing NUL padding
pub fn parse_sam_header(bytes: &[u8]) -> ContainerResult<sam::Header> {
    let end = memchr::memchr(0, bytes).unwrap_or(bytes.len());
    sam::io::Reader::new(&bytes[..end])
        .read_header()
        .map_err(|e| ContainerError::InvalidSamHeader(e.to_string()))
}

/// SAM header as text
pub fn sam_header_text(header: &sam::Header) -> io::Result<Vec<u8>> {
    let mut writer = sam::io::Writer::new(Vec::new());
    writer.write_header(header)?;
    Ok(writer.into_inner())
}

/// Everything read from the start of a CRAM file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub definition: FileDefinition,
    /// Reference ids used by containers and indices are positions in its
    /// sequence dictionary
    pub sam: sam::Header,
    /// Byte offset of the first data container
    pub data_offset: u64,
}

impl FileHeader {
    pub fn version(&self) -> Version {
        self.definition.version
    }

    /// Reference id of a sequence name
    pub fn reference_id(&self, name: &str) -> Option<usize> {
        self.sam.reference_sequences().get_index_of(name.as_bytes())
    }
}

/// Read the file definition and header container from the start of a file
pub fn read_file_header<R: Read>(
    reader: &mut R,
    stringency: ValidationStringency,
) -> ContainerResult<FileHeader> {
    let definition = FileDefinition::read_from(reader)?;
    let headers = CramHeaderReader::new(definition.version, stringency);

    let container = headers.read_header(reader)?;
    let body = read_bytes(reader, container.body_len())?;

    if container.block_count < 1 {
        return Err(ContainerError::MissingFileHeaderBlock);
    }
    let block = Block::read_from(&mut &body[..], definition.version, stringency)?;
    if block.content_type != ContentType::FileHeader {
        return Err(ContainerError::MissingFileHeaderBlock);
    }

    let data = block.decompressed()?;
    if data.len() < 4 {
        return Err(ContainerError::InvalidSamHeader("truncated header block".to_string()));
    }
    let text_len = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if text_len < 0 {
        return Err(ContainerError::NegativeLength {
            field: "SAM header length",
            value: text_len as i64,
        });
    }
    let text_end = (4 + text_len as usize).min(data.len());
    let sam = parse_sam_header(&data[4..text_end])?;

    Ok(FileHeader {
        definition,
        sam,
        data_offset: (FILE_DEFINITION_LEN + container.header_size + body.len()) as u64,
    })
}

/// Write a file definition and header container
///
/// Returns the byte offset at which data containers start.
pub fn write_file_header<W: Write + ?Sized>(
    writer: &mut W,
    definition: &FileDefinition,
    sam: &sam::Header,
) -> io::Result<u64> {
    definition.write_to(writer)?;

    let text = sam_header_text(sam)?;
    let mut payload = Vec::with_capacity(text.len() + 4);
    payload.extend_from_slice(&(text.len() as i32).to_le_bytes());
    payload.extend_from_slice(&text);

    let mut body = Vec::new();
    Block::raw(ContentType::FileHeader, 0, payload).write_to(&mut body, definition.version)?;

    let header = ContainerHeader {
        length: body.len() as i32,
        block_count: 1,
        landmarks: vec![0],
        ..Default::default()
    };
    let header_size = header.write_to(writer, definition.version)?;
    writer.write_all(&body)?;

    Ok((FILE_DEFINITION_LEN + header_size + body.len()) as u64)
}

/// Check whether a file starts with the CRAM magic
///
/// Reads at most four bytes; shorter files are not CRAM. Nothing past the
/// magic is validated.
pub fn is_cram_file<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    let (magic, filled) = read_magic::<4, _>(path)?;
    Ok(filled == CRAM_MAGIC.len() && &magic == CRAM_MAGIC)
}
