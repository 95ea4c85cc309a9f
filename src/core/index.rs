//! Coordinate indices
//!
//! [`CoordinateIndex`] is the one lookup capability the reader needs. Three
//! implementations exist:
//!
//! - [`DiskBasedIndex`]: BAI re-read on every lookup
//! - [`CachingIndex`]: BAI parsed on first use and kept in memory
//! - [`CraiFileIndex`]: CRAI loaded on first use into interval trees
//!
//! [`open_index`] picks one from the index file's format and the reader
//! options.

use crate::core::error::{IndexError, IndexResult};
use crate::core::io::{detect_compression, read_magic, CompressionFormat, IoStrategy, SmartReader};
use crate::core::options::ReaderOptions;
use crate::core::span::FileSpan;
use crate::core::virtual_offset::VirtualOffset;
use crate::formats::bai::{self, read_bai, BAI_MAGIC};
use crate::formats::crai::CraiIndex;
use log::debug;
use noodles::bam::bai::Index as BaiIndex;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// Region lookup over a CRAM file
pub trait CoordinateIndex {
    /// Candidate chunks for records of `reference_id` overlapping
    /// `[start, end]` (1-based; `None` means to the end of the reference)
    ///
    /// `None` when the index has nothing for the region.
    fn span_overlapping(
        &mut self,
        reference_id: usize,
        start: u32,
        end: Option<u32>,
    ) -> IndexResult<Option<FileSpan>>;

    /// Offset past which only unmapped records are stored
    fn start_of_last_linear_bin(&mut self) -> IndexResult<Option<VirtualOffset>>;

    /// Release the index; later lookups fail with [`IndexError::Closed`]
    fn close(&mut self) -> IndexResult<()>;
}

/// On-disk index format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    Bai,
    Crai,
}

/// Where index bytes come from
#[derive(Debug, Clone)]
pub enum IndexSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

impl IndexSource {
    fn open(&self, strategy: IoStrategy) -> IndexResult<Box<dyn Read + '_>> {
        match self {
            IndexSource::File(path) => Ok(Box::new(SmartReader::open(path, strategy)?)),
            IndexSource::Memory(bytes) => Ok(Box::new(Cursor::new(&bytes[..]))),
        }
    }
}

/// Identify an index by its leading bytes, falling back to the extension
pub fn detect_index_format(path: &Path) -> IndexResult<IndexFormat> {
    if !path.exists() {
        return Err(IndexError::FileNotFound(path.to_path_buf()));
    }
    let (magic, filled) = read_magic::<4, _>(path)?;
    if let Some(format) = sniff_index_format(&magic[..filled]) {
        return Ok(format);
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("bai") => Ok(IndexFormat::Bai),
        Some("crai") => Ok(IndexFormat::Crai),
        _ => Err(IndexError::UnrecognizedFormat(path.to_path_buf())),
    }
}

fn sniff_index_format(magic: &[u8]) -> Option<IndexFormat> {
    if magic == &BAI_MAGIC[..] {
        return Some(IndexFormat::Bai);
    }
    match detect_compression(magic) {
        CompressionFormat::Gzip => Some(IndexFormat::Crai),
        CompressionFormat::Bzip2 | CompressionFormat::Plain => None,
    }
}

/// Index file conventionally paired with a CRAM file, if one exists
///
/// Tries `<file>.crai`, `<file>.bai`, then the same names with the `.cram`
/// extension replaced.
pub fn find_index_for(cram_path: &Path) -> Option<PathBuf> {
    let mut candidates = Vec::with_capacity(4);
    for ext in ["crai", "bai"] {
        let mut name = cram_path.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        candidates.push(PathBuf::from(name));
    }
    for ext in ["crai", "bai"] {
        candidates.push(cram_path.with_extension(ext));
    }
    candidates.into_iter().find(|p| p.is_file())
}

/// Open the index at `path` as the variant the options ask for
pub fn open_index(path: &Path, options: &ReaderOptions) -> IndexResult<Box<dyn CoordinateIndex>> {
    let format = detect_index_format(path)?;
    debug!("Opening {:?} index {} (caching: {})", format, path.display(), options.enable_index_caching);

    let source = IndexSource::File(path.to_path_buf());
    Ok(match format {
        IndexFormat::Bai if options.enable_index_caching => {
            Box::new(CachingIndex::new(source, options.index_io_strategy))
        }
        IndexFormat::Bai => Box::new(DiskBasedIndex::new(source, options.index_io_strategy)),
        IndexFormat::Crai => Box::new(CraiFileIndex::new(source)),
    })
}

/// Build an index over bytes already in memory
///
/// The bytes are copied into the index; on error the caller keeps them.
pub fn index_from_bytes(bytes: &[u8], options: &ReaderOptions) -> IndexResult<Box<dyn CoordinateIndex>> {
    let format = sniff_index_format(&bytes[..bytes.len().min(4)])
        .ok_or_else(|| IndexError::UnrecognizedFormat(PathBuf::from("<memory>")))?;

    let source = IndexSource::Memory(bytes.to_vec());
    Ok(match format {
        IndexFormat::Bai if options.enable_index_caching => {
            Box::new(CachingIndex::new(source, IoStrategy::Auto))
        }
        IndexFormat::Bai => Box::new(DiskBasedIndex::new(source, IoStrategy::Auto)),
        IndexFormat::Crai => Box::new(CraiFileIndex::new(source)),
    })
}

/// BAI index that re-reads its source for every lookup
pub struct DiskBasedIndex {
    source: Option<IndexSource>,
    strategy: IoStrategy,
}

impl DiskBasedIndex {
    pub fn new(source: IndexSource, strategy: IoStrategy) -> Self {
        Self {
            source: Some(source),
            strategy,
        }
    }

    fn reader(&self) -> IndexResult<Box<dyn Read + '_>> {
        self.source.as_ref().ok_or(IndexError::Closed)?.open(self.strategy)
    }
}

impl CoordinateIndex for DiskBasedIndex {
    fn span_overlapping(
        &mut self,
        reference_id: usize,
        start: u32,
        end: Option<u32>,
    ) -> IndexResult<Option<FileSpan>> {
        let index = read_bai(self.reader()?)?;
        bai::span_overlapping(&index, reference_id, start, end)
    }

    fn start_of_last_linear_bin(&mut self) -> IndexResult<Option<VirtualOffset>> {
        let index = read_bai(self.reader()?)?;
        Ok(bai::start_of_last_linear_bin(&index))
    }

    fn close(&mut self) -> IndexResult<()> {
        self.source = None;
        Ok(())
    }
}

/// BAI index parsed once and kept in memory
pub struct CachingIndex {
    source: Option<IndexSource>,
    strategy: IoStrategy,
    cache: Option<BaiIndex>,
}

impl CachingIndex {
    pub fn new(source: IndexSource, strategy: IoStrategy) -> Self {
        Self {
            source: Some(source),
            strategy,
            cache: None,
        }
    }

    fn loaded(&mut self) -> IndexResult<&BaiIndex> {
        if self.cache.is_none() {
            let source = self.source.as_ref().ok_or(IndexError::Closed)?;
            let index = read_bai(source.open(self.strategy)?)?;
            debug!("Cached BAI index with {} references", index.reference_sequences().len());
            self.cache = Some(index);
        }
        self.cache.as_ref().ok_or(IndexError::Closed)
    }
}

impl CoordinateIndex for CachingIndex {
    fn span_overlapping(
        &mut self,
        reference_id: usize,
        start: u32,
        end: Option<u32>,
    ) -> IndexResult<Option<FileSpan>> {
        bai::span_overlapping(self.loaded()?, reference_id, start, end)
    }

    fn start_of_last_linear_bin(&mut self) -> IndexResult<Option<VirtualOffset>> {
        Ok(bai::start_of_last_linear_bin(self.loaded()?))
    }

    fn close(&mut self) -> IndexResult<()> {
        self.source = None;
        self.cache = None;
        Ok(())
    }
}

/// CRAI index loaded on first lookup
pub struct CraiFileIndex {
    source: Option<IndexSource>,
    index: Option<CraiIndex>,
}

impl CraiFileIndex {
    pub fn new(source: IndexSource) -> Self {
        Self {
            source: Some(source),
            index: None,
        }
    }

    fn loaded(&mut self) -> IndexResult<&CraiIndex> {
        if self.index.is_none() {
            let source = self.source.as_ref().ok_or(IndexError::Closed)?;
            let index = CraiIndex::read_from(source.open(IoStrategy::Auto)?)?;
            debug!("Loaded CRAI index with {} records", index.records().len());
            self.index = Some(index);
        }
        self.index.as_ref().ok_or(IndexError::Closed)
    }
}

impl CoordinateIndex for CraiFileIndex {
    fn span_overlapping(
        &mut self,
        reference_id: usize,
        start: u32,
        end: Option<u32>,
    ) -> IndexResult<Option<FileSpan>> {
        Ok(self.loaded()?.span_overlapping(reference_id, start, end))
    }

    fn start_of_last_linear_bin(&mut self) -> IndexResult<Option<VirtualOffset>> {
        Ok(self.loaded()?.start_of_last_linear_bin())
    }

    fn close(&mut self) -> IndexResult<()> {
        self.source = None;
        self.index = None;
        Ok(())
    }
}
