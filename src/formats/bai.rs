//! BAI coordinate index
//!
//! Parsing, binning and chunk selection are done by `noodles`. When a BAI is
//! built over a CRAM file each virtual position is a (container byte offset,
//! slice index) pair rather than a BGZF address, so chunks are handed back
//! as [`VirtualOffset`]s.

use crate::core::error::{IndexError, IndexResult};
use crate::core::span::{optimize_chunks, Chunk, FileSpan};
use crate::core::virtual_offset::VirtualOffset;
use noodles::bam::bai;
use noodles::core::region::Interval;
use noodles::core::Position;
use noodles::csi::binning_index::index::reference_sequence::bin::Chunk as IndexChunk;
use noodles::csi::binning_index::BinningIndex;
use std::io::Read;

/// Magic bytes of a BAI file
pub const BAI_MAGIC: &[u8; 4] = b"BAI\x01";

/// Largest position addressable by the BAI binning scheme
const MAX_POSITION: usize = (1 << 29) - 1;

/// Parse a whole BAI index
pub fn read_bai<R: Read>(reader: R) -> IndexResult<bai::Index> {
    bai::io::Reader::new(reader)
        .read_index()
        .map_err(IndexError::InvalidBai)
}

fn to_chunk(chunk: &IndexChunk) -> Chunk {
    Chunk::new(
        VirtualOffset::from_raw(u64::from(chunk.start())),
        VirtualOffset::from_raw(u64::from(chunk.end())),
    )
}

/// Chunks that may hold records of `reference_id` overlapping the 1-based
/// closed region `[start, end]`; `None` for `end` means to the end of the
/// reference
///
/// `None` when the reference is unknown, the region lies outside the
/// binning scheme, or no bin has chunks for it.
pub fn span_overlapping(
    index: &bai::Index,
    reference_id: usize,
    start: u32,
    end: Option<u32>,
) -> IndexResult<Option<FileSpan>> {
    if reference_id >= index.reference_sequences().len() {
        return Ok(None);
    }

    let start = (start as usize).max(1);
    let end = end.map_or(MAX_POSITION, |e| (e as usize).min(MAX_POSITION));
    if start > end {
        return Ok(None);
    }
    let (Some(start), Some(end)) = (Position::new(start), Position::new(end)) else {
        return Ok(None);
    };

    let chunks: Vec<Chunk> = index
        .query(reference_id, Interval::from(start..=end))
        .map_err(IndexError::InvalidBai)?
        .iter()
        .map(to_chunk)
        .collect();
    if chunks.is_empty() {
        return Ok(None);
    }
    // noodles already pruned against the linear index; coalesce per container
    Ok(Some(FileSpan::new(optimize_chunks(chunks, VirtualOffset::ZERO))))
}

/// Last linear-index entry of the last reference that has one
pub fn start_of_last_linear_bin(index: &bai::Index) -> Option<VirtualOffset> {
    index
        .reference_sequences()
        .iter()
        .rev()
        .find_map(|reference| reference.index().last().copied())
        .map(|position| VirtualOffset::from_raw(u64::from(position)))
}
