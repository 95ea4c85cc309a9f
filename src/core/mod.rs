//! Core random-access machinery
//!
//! This module contains the virtual offset codec, coordinate indices,
//! the container resolver and the reader/iterator lifecycle.

pub(crate) mod error;
pub(crate) mod index;
pub mod io;
pub mod itf8;
pub(crate) mod iterator;
pub(crate) mod options;
pub(crate) mod reader;
pub(crate) mod reference;
pub mod resolver;
pub(crate) mod span;
pub mod virtual_offset;

pub use error::{
    ContainerError, ContainerResult, CramSeekError, ErrorKind, IndexError, IndexResult,
    MisuseError, Result, UnsupportedOperation,
};
pub use index::{
    detect_index_format, find_index_for, index_from_bytes, open_index, CachingIndex,
    CoordinateIndex, CraiFileIndex, DiskBasedIndex, IndexFormat, IndexSource,
};
pub use io::{
    detect_compression, read_bytes, CompressionFormat, CramStream, IoStrategy, SmartReader, DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD,
};
pub use iterator::{ContainerCodec, DecodeContext, QueryResult, RecordCodec, RecordIterator};
pub use options::{ReaderOptions, ValidationStringency};
pub use reader::{QueryInterval, Reader, ReaderBuilder};
pub use reference::{InMemoryReference, NoReference, ReferenceSource};
pub use resolver::resolve_container;
pub use span::{optimize_chunks, Chunk, FileSpan};
pub use virtual_offset::VirtualOffset;
