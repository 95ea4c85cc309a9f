//! On-disk structures
//!
//! Parsers (and writers) for the CRAM file definition, containers and
//! blocks, and lookups over BAI and CRAI indices read with `noodles`.

pub mod bai;
pub mod block;
pub mod container;
pub mod crai;
pub mod crc;
pub mod file_header;

pub use bai::{read_bai, BAI_MAGIC};
pub use block::{Block, CompressionMethod, ContentType};
pub use container::{Container, ContainerHeader, ContainerHeaderReader, CramHeaderReader};
pub use crai::{read_crai, CraiIndex};
pub use file_header::{
    is_cram_file, parse_sam_header, read_file_header, sam_header_text, write_file_header,
    FileDefinition, FileHeader, Version, CRAM_MAGIC,
};
