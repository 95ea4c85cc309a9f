//! Error types for CramSeek
//!
//! Defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for CramSeek operations
#[derive(Debug, Error)]
pub enum CramSeekError {
    /// Reader was built with an invalid combination of inputs
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Operation is not available for this reader
    #[error("Unsupported operation: {0}")]
    Unsupported(#[from] UnsupportedOperation),

    /// Reader used in a state that does not permit the operation
    #[error("Invalid reader state: {0}")]
    Misuse(#[from] MisuseError),

    /// CRAM structure errors
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Coordinate index errors
    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    /// Record codec failures
    #[error("Record decoding error: {0}")]
    Decode(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid reader construction
    Configuration,
    /// Operation not supported; never worth retrying
    Unsupported,
    /// Failure while reading the file, the index or a container
    Io,
    /// Operation attempted in the wrong reader state
    Misuse,
}

impl CramSeekError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CramSeekError::Configuration(_) => ErrorKind::Configuration,
            CramSeekError::Unsupported(_) => ErrorKind::Unsupported,
            CramSeekError::Misuse(_) => ErrorKind::Misuse,
            CramSeekError::Container(_)
            | CramSeekError::Index(_)
            | CramSeekError::Decode(_)
            | CramSeekError::Io(_) => ErrorKind::Io,
        }
    }

    /// Check whether this error has the given category
    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }
}

/// Operations the reader refuses outright
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UnsupportedOperation {
    #[error("multiple interval queries not implemented")]
    MultiIntervalQuery,

    #[error("slice-level seeking not implemented")]
    SliceSeeking,

    #[error("file pointer spanning reads not implemented")]
    FilePointerSpanningReads,

    #[error("no index is available for this CRAM file")]
    IndexRequired,

    #[error("cannot query stream-based CRAM file")]
    StreamQuery,

    #[error("underlying stream is not seekable")]
    NotSeekable,
}

/// Reader lifecycle violations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MisuseError {
    #[error("reader is closed")]
    Closed,

    #[error("iteration in progress")]
    IterationInProgress,

    #[error("stream has been consumed and cannot be rewound")]
    StreamExhausted,
}

/// Errors that can occur while parsing CRAM structures
#[derive(Debug, Error)]
pub enum ContainerError {
    /// File does not start with the CRAM magic
    #[error("Invalid CRAM magic number: {0:?}")]
    InvalidMagic([u8; 4]),

    /// Major version outside 2.x / 3.x
    #[error("Unsupported CRAM version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// A length field decoded to a negative value
    #[error("Negative {field}: {value}")]
    NegativeLength { field: &'static str, value: i64 },

    /// Stored CRC32 does not match the bytes read
    #[error("CRC32 mismatch in {what}: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        what: &'static str,
        stored: u32,
        computed: u32,
    },

    /// Block compressed with a codec this crate delegates nowhere
    #[error("Unsupported block compression method: {0}")]
    UnsupportedCompression(u8),

    /// Header container lacks the SAM header block
    #[error("Missing file header block in header container")]
    MissingFileHeaderBlock,

    /// SAM header text could not be interpreted
    #[error("Invalid SAM header: {0}")]
    InvalidSamHeader(String),

    /// I/O error while reading a structure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while loading or querying a coordinate index
#[derive(Debug, Error)]
pub enum IndexError {
    /// BAI file could not be parsed or queried
    #[error("Invalid BAI index: {0}")]
    InvalidBai(#[source] std::io::Error),

    /// CRAI file could not be parsed
    #[error("Invalid CRAI index: {0}")]
    InvalidCrai(#[source] std::io::Error),

    /// Neither BAI nor CRAI
    #[error("Unrecognized index format: {0}")]
    UnrecognizedFormat(PathBuf),

    /// Index file not found
    #[error("Index file not found: {0}")]
    FileNotFound(PathBuf),

    /// Lookup attempted after `close`
    #[error("Index has been closed")]
    Closed,

    /// I/O error during index reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CramSeek operations
pub type Result<T> = std::result::Result<T, CramSeekError>;

/// Result type alias for CRAM structure parsing
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// Result type alias for index operations
pub type IndexResult<T> = std::result::Result<T, IndexError>;
