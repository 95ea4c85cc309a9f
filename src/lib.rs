//! CramSeek - Indexed random-access reading of CRAM files
//!
//! Resolves a genomic region query into a position inside a CRAM file and
//! hands back a record iterator starting at the first container that can
//! hold matching records.
//!
//! # Features
//!
//! - BAI (disk-based or cached) and CRAI coordinate indices
//! - CRAM 2.x and 3.x container parsing with CRC32 checks
//! - Pluggable record codec and reference source
//! - File or stream input
//!
//! # Example
//!
//! ```ignore
//! use cram_seek::{Reader, ReaderOptions};
//!
//! let mut reader = Reader::builder()
//!     .file("sample.cram")
//!     .index_file("sample.cram.crai")
//!     .options(ReaderOptions { enable_index_caching: true, ..Default::default() })
//!     .build()?;
//!
//! let hits = reader.query_alignment_start("chr1", 1_000_000)?;
//! for container in hits {
//!     let container = container?;
//!     println!("{} records at byte {}", container.header.record_count, container.offset);
//! }
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    Chunk, ContainerCodec, CoordinateIndex, CramSeekError, CramStream, ErrorKind, FileSpan,
    IoStrategy, QueryResult, Reader, ReaderBuilder, ReaderOptions, RecordCodec, RecordIterator,
    ReferenceSource, Result, ValidationStringency, VirtualOffset,
};
pub use formats::{is_cram_file, Container, ContainerHeader, FileHeader};
