//! File spans returned by coordinate indices
//!
//! A [`FileSpan`] is an ordered list of [`Chunk`]s, each a half-open range of
//! virtual offsets believed to hold records for a queried region.

use crate::core::virtual_offset::VirtualOffset;

/// Range of virtual offsets `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Chunk {
    pub start: VirtualOffset,
    pub end: VirtualOffset,
}

impl Chunk {
    pub fn new(start: VirtualOffset, end: VirtualOffset) -> Self {
        Self { start, end }
    }

    /// Chunks overlap when neither ends before the other starts
    pub fn overlaps(&self, other: &Chunk) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Chunks are adjacent when they touch the same container
    pub fn is_adjacent_to(&self, other: &Chunk) -> bool {
        self.end.same_container(other.start) || self.start.same_container(other.end)
    }
}

/// Candidate regions reported by an index lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSpan {
    chunks: Vec<Chunk>,
}

impl FileSpan {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Flatten to `[start0, end0, start1, end1, ...]` raw values
    pub fn to_coordinate_array(&self) -> Vec<u64> {
        self.chunks
            .iter()
            .flat_map(|c| [c.start.raw(), c.end.raw()])
            .collect()
    }

    /// Chunk start offsets in file order
    pub fn candidate_offsets(&self) -> impl Iterator<Item = VirtualOffset> + '_ {
        self.chunks.iter().map(|c| c.start)
    }
}

impl From<Vec<Chunk>> for FileSpan {
    fn from(chunks: Vec<Chunk>) -> Self {
        Self::new(chunks)
    }
}

/// Sort chunks, drop those ending at or before `minimum_offset`, and
/// coalesce overlapping chunks or chunks touching the same container.
pub fn optimize_chunks(mut chunks: Vec<Chunk>, minimum_offset: VirtualOffset) -> Vec<Chunk> {
    chunks.sort();

    let mut result: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if chunk.end <= minimum_offset {
            continue;
        }
        match result.last_mut() {
            Some(last) if last.overlaps(&chunk) || last.is_adjacent_to(&chunk) => {
                if chunk.end > last.end {
                    last.end = chunk.end;
                }
            }
            _ => result.push(chunk),
        }
    }
    result
}
