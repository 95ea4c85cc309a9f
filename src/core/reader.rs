//! CRAM reader
//!
//! [`Reader`] ties a CRAM source, an optional coordinate index and a record
//! codec together. It hands out at most one [`RecordIterator`] at a time and
//! answers region queries by positioning a fresh iterator at the first
//! container that can hold matching records.
//!
//! # Example
//! ```ignore
//! use cram_seek::{Reader, QueryResult};
//!
//! let mut reader = Reader::builder()
//!     .file("sample.cram")
//!     .index_file("sample.cram.crai")
//!     .build()?;
//!
//! for container in reader.query_alignment_start("chr1", 100_000)? {
//!     println!("{}", container?.offset);
//! }
//! ```

use crate::core::error::{CramSeekError, MisuseError, Result, UnsupportedOperation};
use crate::core::index::{find_index_for, index_from_bytes, open_index, CoordinateIndex};
use crate::core::io::CramStream;
use crate::core::iterator::{ContainerCodec, QueryResult, RecordCodec, RecordIterator};
use crate::core::options::{ReaderOptions, ValidationStringency};
use crate::core::reference::{NoReference, ReferenceSource};
use crate::core::span::FileSpan;
use crate::formats::file_header::{is_cram_file, read_file_header, FileHeader};
use log::debug;
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where records come from
enum Origin {
    File(PathBuf),
    /// Parked stream; `None` while an iterator owns it
    Stream(Option<CramStream>),
    Closed,
}

enum IndexState {
    Absent,
    Path(PathBuf),
    Memory(Vec<u8>),
    Loaded(Box<dyn CoordinateIndex>),
}

/// One interval of a multi-interval query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryInterval {
    pub reference_id: usize,
    pub start: u32,
    pub end: Option<u32>,
}

/// Builder for [`Reader`]
pub struct ReaderBuilder<C: RecordCodec + Clone = ContainerCodec> {
    file: Option<PathBuf>,
    stream: Option<CramStream>,
    index: IndexState,
    reference: Arc<dyn ReferenceSource>,
    options: ReaderOptions,
    codec: C,
}

impl Default for ReaderBuilder<ContainerCodec> {
    fn default() -> Self {
        Self {
            file: None,
            stream: None,
            index: IndexState::Absent,
            reference: Arc::new(NoReference),
            options: ReaderOptions::default(),
            codec: ContainerCodec,
        }
    }
}

impl<C: RecordCodec + Clone> ReaderBuilder<C> {
    /// Read from a CRAM file
    pub fn file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Read from a stream; seekable streams support region queries
    pub fn stream(mut self, stream: CramStream) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Read from any seekable source
    pub fn seekable_stream<R: Read + Seek + 'static>(self, reader: R) -> Self {
        self.stream(CramStream::seekable(reader))
    }

    /// Index file (BAI or CRAI)
    pub fn index_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.index = IndexState::Path(path.into());
        self
    }

    /// Index bytes read from a stream (BAI or CRAI)
    pub fn index_reader<R: Read>(mut self, mut reader: R) -> io::Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.index = IndexState::Memory(bytes);
        Ok(self)
    }

    /// Already constructed index
    pub fn index(mut self, index: Box<dyn CoordinateIndex>) -> Self {
        self.index = IndexState::Loaded(index);
        self
    }

    /// Look for `<file>.crai` / `<file>.bai` next to the CRAM file
    ///
    /// Has no effect when an index was given explicitly or no file is set.
    pub fn discover_index(mut self) -> Self {
        if matches!(self.index, IndexState::Absent) {
            if let Some(path) = self.file.as_deref().and_then(find_index_for) {
                debug!("Found index {}", path.display());
                self.index = IndexState::Path(path);
            }
        }
        self
    }

    pub fn reference(mut self, reference: Arc<dyn ReferenceSource>) -> Self {
        self.reference = reference;
        self
    }

    pub fn options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validation_stringency(mut self, stringency: ValidationStringency) -> Self {
        self.options.validation_stringency = stringency;
        self
    }

    /// Swap the record codec
    pub fn codec<D: RecordCodec + Clone>(self, codec: D) -> ReaderBuilder<D> {
        ReaderBuilder {
            file: self.file,
            stream: self.stream,
            index: self.index,
            reference: self.reference,
            options: self.options,
            codec,
        }
    }

    /// Build the reader
    ///
    /// Exactly one of file and stream must be set. Stream readers read the
    /// file header immediately; file readers wait until first use.
    pub fn build(self) -> Result<Reader<C>> {
        let origin = match (self.file, self.stream) {
            (Some(path), None) => Origin::File(path),
            (None, Some(stream)) => Origin::Stream(Some(stream)),
            (None, None) => {
                return Err(CramSeekError::Configuration(
                    "either a file or a stream is required".to_string(),
                ))
            }
            (Some(_), Some(_)) => {
                return Err(CramSeekError::Configuration(
                    "a file and a stream cannot both be given".to_string(),
                ))
            }
        };

        let mut reader = Reader {
            origin,
            iterator: None,
            header: None,
            index: self.index,
            reference: self.reference,
            codec: self.codec,
            options: self.options,
        };

        if let Origin::Stream(_) = reader.origin {
            debug!("Stream reader: reading file header eagerly");
            reader.iterator()?;
        }
        Ok(reader)
    }
}

/// Indexed random-access CRAM reader
pub struct Reader<C: RecordCodec + Clone = ContainerCodec> {
    origin: Origin,
    iterator: Option<RecordIterator<C>>,
    header: Option<FileHeader>,
    index: IndexState,
    reference: Arc<dyn ReferenceSource>,
    codec: C,
    options: ReaderOptions,
}

impl Reader<ContainerCodec> {
    pub fn builder() -> ReaderBuilder<ContainerCodec> {
        ReaderBuilder::default()
    }

    /// Open a CRAM file, picking up an index that sits next to it
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        Self::builder().file(path).discover_index().build()
    }

    /// Whether the file starts with the CRAM magic
    pub fn is_format<P: AsRef<Path>>(path: P) -> io::Result<bool> {
        is_cram_file(path)
    }
}

impl<C: RecordCodec + Clone> Reader<C> {
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.origin, Origin::Closed)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(MisuseError::Closed.into());
        }
        Ok(())
    }

    /// Whether an index is configured; never loads it
    pub fn has_index(&self) -> bool {
        !matches!(self.index, IndexState::Absent)
    }

    /// The coordinate index, loaded on first call
    pub fn index(&mut self) -> Result<&mut dyn CoordinateIndex> {
        self.ensure_open()?;
        let loaded = match std::mem::replace(&mut self.index, IndexState::Absent) {
            IndexState::Absent => return Err(UnsupportedOperation::IndexRequired.into()),
            IndexState::Path(path) => match open_index(&path, &self.options) {
                Ok(index) => index,
                Err(e) => {
                    self.index = IndexState::Path(path);
                    return Err(e.into());
                }
            },
            IndexState::Memory(bytes) => match index_from_bytes(&bytes, &self.options) {
                Ok(index) => index,
                Err(e) => {
                    self.index = IndexState::Memory(bytes);
                    return Err(e.into());
                }
            },
            IndexState::Loaded(index) => index,
        };
        self.index = IndexState::Loaded(loaded);
        match &mut self.index {
            IndexState::Loaded(index) => Ok(&mut **index),
            _ => Err(UnsupportedOperation::IndexRequired.into()),
        }
    }

    /// File header, read once from the first iterator
    pub fn file_header(&mut self) -> Result<&FileHeader> {
        self.ensure_open()?;
        if self.header.is_none() {
            self.iterator()?;
        }
        self.header
            .as_ref()
            .ok_or_else(|| CramSeekError::Misuse(MisuseError::StreamExhausted))
    }

    /// Iterator over all records from the first data container
    ///
    /// Stream readers keep returning their active iterator. File readers
    /// start a fresh one on every call.
    pub fn iterator(&mut self) -> Result<&mut RecordIterator<C>> {
        self.ensure_open()?;
        if let Origin::Stream(None) = self.origin {
            if self.iterator.is_some() {
                return self.active_iterator();
            }
        }

        let stream = if let Origin::File(path) = &self.origin {
            CramStream::open(path)?
        } else {
            self.take_stream_at_start()?
        };
        let iterator = self.new_iterator(stream)?;
        Ok(self.install(iterator))
    }

    fn active_iterator(&mut self) -> Result<&mut RecordIterator<C>> {
        self.iterator
            .as_mut()
            .ok_or_else(|| CramSeekError::Misuse(MisuseError::StreamExhausted))
    }

    /// Read the file header and wrap `stream`; a stream reader gets its
    /// stream back when the header cannot be read
    fn new_iterator(&mut self, mut stream: CramStream) -> Result<RecordIterator<C>> {
        let stringency = self.options.validation_stringency;
        match read_file_header(&mut stream, stringency) {
            Ok(header) => Ok(RecordIterator::with_header(
                stream,
                header,
                Arc::clone(&self.reference),
                self.codec.clone(),
                stringency,
            )),
            Err(e) => {
                self.park_stream(stream);
                Err(e.into())
            }
        }
    }

    fn install(&mut self, iterator: RecordIterator<C>) -> &mut RecordIterator<C> {
        if self.header.is_none() {
            self.header = Some(iterator.file_header().clone());
        }
        self.iterator.insert(iterator)
    }

    /// Drop the active iterator, parking a stream reader's stream
    fn release_iterator(&mut self) {
        if let Some(iterator) = self.iterator.take() {
            if let Origin::Stream(slot) = &mut self.origin {
                if slot.is_none() {
                    *slot = Some(iterator.into_stream());
                }
            }
        }
    }

    /// Drop an iterator that was not installed, keeping a stream reader's
    /// stream
    fn park(&mut self, iterator: RecordIterator<C>) {
        self.park_stream(iterator.into_stream());
    }

    fn park_stream(&mut self, stream: CramStream) {
        if let Origin::Stream(slot) = &mut self.origin {
            *slot = Some(stream);
        }
    }

    /// Take the parked stream and rewind it to byte 0
    ///
    /// A fresh stream that was never read is used as is.
    fn take_stream_at_start(&mut self) -> Result<CramStream> {
        let Origin::Stream(slot) = &mut self.origin else {
            return Err(MisuseError::StreamExhausted.into());
        };
        let mut stream = slot.take().ok_or(MisuseError::StreamExhausted)?;
        if stream.position() == 0 {
            return Ok(stream);
        }
        if !stream.is_seekable() {
            *slot = Some(stream);
            return Err(MisuseError::StreamExhausted.into());
        }
        if let Err(e) = stream.seek_to(0) {
            *slot = Some(stream);
            return Err(e.into());
        }
        Ok(stream)
    }

    fn stream_is_seekable(&self) -> bool {
        match &self.origin {
            Origin::File(_) => true,
            Origin::Stream(Some(stream)) => stream.is_seekable(),
            // the stream lives in the active iterator
            Origin::Stream(None) => self.iterator.as_ref().is_some_and(|it| it.is_seekable()),
            Origin::Closed => false,
        }
    }

    /// Fresh iterator on a seekable handle, positioned at the first data
    /// container
    fn seekable_iterator(&mut self) -> Result<RecordIterator<C>> {
        if !self.stream_is_seekable() {
            return Err(UnsupportedOperation::NotSeekable.into());
        }
        let stream = if let Origin::File(path) = &self.origin {
            CramStream::open(path)?
        } else {
            self.release_iterator();
            self.take_stream_at_start()?
        };
        self.new_iterator(stream)
    }

    /// Records overlapping `start` (1-based) on the named sequence
    ///
    /// Unknown names and regions the index has nothing for give
    /// [`QueryResult::Empty`]. When the index reports candidates but none of
    /// their containers reaches `start`, the active iterator is dropped and
    /// [`QueryResult::NotFound`] is returned.
    pub fn query_alignment_start(&mut self, sequence_name: &str, start: u32) -> Result<QueryResult<'_, C>> {
        self.ensure_open()?;

        let Some(reference_id) = self.file_header()?.reference_id(sequence_name) else {
            debug!("Sequence {} not in header", sequence_name);
            return Ok(QueryResult::Empty);
        };

        if !self.has_index() {
            if self.options.require_index_for_queries {
                return Err(UnsupportedOperation::IndexRequired.into());
            }
            return Ok(QueryResult::Empty);
        }

        let span = match self.index()?.span_overlapping(reference_id, start, None)? {
            Some(span) if !span.is_empty() => span,
            _ => {
                debug!("Index has no entry for {}:{}", sequence_name, start);
                return Ok(QueryResult::Empty);
            }
        };
        debug!("Index reports {} candidate chunks for {}:{}", span.len(), sequence_name, start);

        let mut iterator = self.seekable_iterator()?;
        self.release_iterator();
        match iterator.resolve(&span, start) {
            Ok(Some(offset)) => {
                debug!("Positioned at container {}", offset);
                Ok(QueryResult::Positioned(self.install(iterator)))
            }
            Ok(None) => {
                self.park(iterator);
                Ok(QueryResult::NotFound)
            }
            Err(e) => {
                self.park(iterator);
                Err(e)
            }
        }
    }

    /// Records stored after the last mapped container
    ///
    /// Requires an index. When the index has no linear bins the iterator
    /// starts at the first data container.
    pub fn query_unmapped(&mut self) -> Result<&mut RecordIterator<C>> {
        self.ensure_open()?;
        if !self.has_index() {
            return Err(UnsupportedOperation::IndexRequired.into());
        }

        let last = self.index()?.start_of_last_linear_bin()?;
        let mut iterator = self.seekable_iterator()?;
        self.release_iterator();
        if let Some(offset) = last {
            debug!("Unmapped records start at {}", offset);
            if let Err(e) = iterator.seek(offset.container_offset()) {
                self.park(iterator);
                return Err(e);
            }
        }
        Ok(self.install(iterator))
    }

    /// Multi-interval queries are not supported
    pub fn query_intervals(&mut self, _intervals: &[QueryInterval], _contained: bool) -> Result<QueryResult<'_, C>> {
        self.ensure_open()?;
        if self.iterator.is_some() {
            return Err(MisuseError::IterationInProgress.into());
        }
        if !self.has_index() {
            return Err(UnsupportedOperation::StreamQuery.into());
        }
        Err(UnsupportedOperation::MultiIntervalQuery.into())
    }

    /// Slice-level seeking is not supported
    pub fn iterator_for_span(&mut self, _span: &FileSpan) -> Result<&mut RecordIterator<C>> {
        Err(UnsupportedOperation::SliceSeeking.into())
    }

    /// Not supported
    pub fn file_pointer_spanning_reads(&self) -> Result<FileSpan> {
        Err(UnsupportedOperation::FilePointerSpanningReads.into())
    }

    /// Stringency handed to iterators created from now on
    pub fn set_validation_stringency(&mut self, stringency: ValidationStringency) {
        self.options.validation_stringency = stringency;
    }

    pub fn validation_stringency(&self) -> ValidationStringency {
        self.options.validation_stringency
    }

    /// Release the iterator, the stream and the index, in that order
    ///
    /// Only index errors are reported. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        self.iterator = None;
        self.origin = Origin::Closed;
        debug!("Reader closed");

        match std::mem::replace(&mut self.index, IndexState::Absent) {
            IndexState::Loaded(mut index) => index.close()?,
            IndexState::Absent | IndexState::Path(_) | IndexState::Memory(_) => {}
        }
        Ok(())
    }
}
