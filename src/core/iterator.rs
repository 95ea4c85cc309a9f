//! Sequential container iteration
//!
//! A [`RecordIterator`] owns the CRAM stream, reads the file header once and
//! then walks containers from wherever the stream is positioned. Turning a
//! container into records is delegated to a [`RecordCodec`].

use crate::core::error::{CramSeekError, Result};
use crate::core::io::CramStream;
use crate::core::options::ValidationStringency;
use crate::core::reference::ReferenceSource;
use crate::core::resolver::resolve_container;
use crate::core::span::FileSpan;
use crate::formats::container::{Container, CramHeaderReader};
use crate::formats::file_header::{read_file_header, FileHeader};
use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;

/// What a codec may consult while decoding a container
pub struct DecodeContext<'a> {
    pub header: &'a FileHeader,
    pub reference: &'a dyn ReferenceSource,
    pub stringency: ValidationStringency,
}

/// Turns containers into records
pub trait RecordCodec {
    type Record;

    fn decode(&mut self, container: Container, context: &DecodeContext<'_>) -> Result<Vec<Self::Record>>;
}

/// Codec that hands back each container undecoded
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerCodec;

impl RecordCodec for ContainerCodec {
    type Record = Container;

    fn decode(&mut self, container: Container, _context: &DecodeContext<'_>) -> Result<Vec<Container>> {
        Ok(vec![container])
    }
}

/// Cursor over the records of a CRAM stream
pub struct RecordIterator<C: RecordCodec = ContainerCodec> {
    stream: CramStream,
    header: FileHeader,
    headers: CramHeaderReader,
    reference: Arc<dyn ReferenceSource>,
    codec: C,
    stringency: ValidationStringency,
    pending: VecDeque<C::Record>,
    exhausted: bool,
}

impl<C: RecordCodec> RecordIterator<C> {
    /// Read the file header from `stream` and stop at the first data container
    pub fn new(
        mut stream: CramStream,
        reference: Arc<dyn ReferenceSource>,
        codec: C,
        stringency: ValidationStringency,
    ) -> Result<Self> {
        let header = read_file_header(&mut stream, stringency)?;
        Ok(Self::with_header(stream, header, reference, codec, stringency))
    }

    /// Wrap a stream whose file header was already read
    pub fn with_header(
        stream: CramStream,
        header: FileHeader,
        reference: Arc<dyn ReferenceSource>,
        codec: C,
        stringency: ValidationStringency,
    ) -> Self {
        debug!(
            "CRAM {} with {} reference sequences, data at byte {}",
            header.version(),
            header.sam.reference_sequences().len(),
            header.data_offset
        );
        Self {
            headers: CramHeaderReader::new(header.version(), stringency),
            stream,
            header,
            reference,
            codec,
            stringency,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn file_header(&self) -> &FileHeader {
        &self.header
    }

    pub fn validation_stringency(&self) -> ValidationStringency {
        self.stringency
    }

    pub fn is_seekable(&self) -> bool {
        self.stream.is_seekable()
    }

    /// Byte position of the underlying stream
    pub fn stream_offset(&self) -> u64 {
        self.stream.position()
    }

    /// Reposition at a container boundary, dropping buffered records
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.stream.seek_to(offset)?;
        self.pending.clear();
        self.exhausted = false;
        Ok(())
    }

    /// Reposition at the first data container
    pub fn rewind(&mut self) -> Result<()> {
        self.seek(self.header.data_offset)
    }

    /// Position at the first candidate container of `span` overlapping
    /// `start`, returning its offset
    pub fn resolve(&mut self, span: &FileSpan, start: u32) -> Result<Option<u64>> {
        let resolved = resolve_container(&mut self.stream, &self.headers, span, start)?;
        self.pending.clear();
        self.exhausted = false;
        Ok(resolved)
    }

    /// Read the next container; `None` at end of data or at the EOF container
    pub fn next_container(&mut self) -> Result<Option<Container>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.stream.at_eof()? {
            self.exhausted = true;
            return Ok(None);
        }

        let offset = self.stream.position();
        let container = match Container::read_from(&mut self.stream, offset, &self.headers) {
            Ok(container) => container,
            Err(e) => {
                self.exhausted = true;
                return Err(e.into());
            }
        };
        if container.header.is_eof() {
            debug!("EOF container at byte {}", offset);
            self.exhausted = true;
            return Ok(None);
        }
        Ok(Some(container))
    }

    /// Give up the stream, discarding iteration state
    pub fn into_stream(self) -> CramStream {
        self.stream
    }
}

impl<C: RecordCodec> Iterator for RecordIterator<C> {
    type Item = Result<C::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }

            let container = match self.next_container() {
                Ok(Some(container)) => container,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            let offset = container.offset;

            let context = DecodeContext {
                header: &self.header,
                reference: self.reference.as_ref(),
                stringency: self.stringency,
            };
            match self.codec.decode(container, &context) {
                Ok(records) => self.pending.extend(records),
                Err(e) => {
                    let problem = CramSeekError::Decode(format!("container at byte {}: {}", offset, e));
                    if let Err(e) = self.stringency.check(problem) {
                        return Some(Err(e));
                    }
                }
            }
        }
    }
}

/// Outcome of a region query
///
/// `Empty` and `NotFound` both yield no records. `Empty` means the index had
/// no entry for the region; `NotFound` means candidates were examined and
/// none overlapped, after which the reader holds no active iterator.
pub enum QueryResult<'a, C: RecordCodec = ContainerCodec> {
    Empty,
    NotFound,
    Positioned(&'a mut RecordIterator<C>),
}

impl<'a, C: RecordCodec> QueryResult<'a, C> {
    pub fn is_positioned(&self) -> bool {
        matches!(self, QueryResult::Positioned(_))
    }

    /// The positioned iterator, if any
    pub fn into_iterator(self) -> Option<&'a mut RecordIterator<C>> {
        match self {
            QueryResult::Positioned(iterator) => Some(iterator),
            QueryResult::Empty | QueryResult::NotFound => None,
        }
    }
}

impl<C: RecordCodec> Iterator for QueryResult<'_, C> {
    type Item = Result<C::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            QueryResult::Positioned(iterator) => iterator.next(),
            QueryResult::Empty | QueryResult::NotFound => None,
        }
    }
}

impl<C: RecordCodec> std::fmt::Debug for QueryResult<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryResult::Empty => f.write_str("Empty"),
            QueryResult::NotFound => f.write_str("NotFound"),
            QueryResult::Positioned(iterator) => write!(f, "Positioned(byte {})", iterator.stream_offset()),
        }
    }
}
