//! CRAI container index
//!
//! A CRAI file is gzip-compressed text with one record per slice
//! (reference id, alignment start, alignment span, container offset, slice
//! offset, slice size). Records are read with `noodles` and held in one
//! interval tree per reference for overlap lookup. Unplaced slices have no
//! reference id and are only used to find the end of the mapped data.

use crate::core::error::{IndexError, IndexResult};
use crate::core::span::{optimize_chunks, Chunk, FileSpan};
use crate::core::virtual_offset::VirtualOffset;
use noodles::cram::crai;
use rust_lapper::{Interval, Lapper};
use std::collections::HashMap;
use std::io::Read;

/// Read the records of a gzip-compressed CRAI
pub fn read_crai<R: Read>(reader: R) -> IndexResult<Vec<crai::Record>> {
    crai::Reader::new(reader)
        .read_index()
        .map_err(IndexError::InvalidCrai)
}

/// In-memory CRAI with per-reference interval trees
pub struct CraiIndex {
    records: Vec<crai::Record>,
    /// Slice ordinal of each record within its container
    slice_indices: Vec<u16>,
    /// Reference id -> intervals, valued by record position
    trees: HashMap<usize, Lapper<u64, usize>>,
}

impl CraiIndex {
    /// Load a gzip-compressed CRAI
    pub fn read_from<R: Read>(reader: R) -> IndexResult<Self> {
        Ok(Self::from_records(read_crai(reader)?))
    }

    pub fn from_records(records: Vec<crai::Record>) -> Self {
        let mut slice_indices = Vec::with_capacity(records.len());
        let mut current: Option<(u64, u16)> = None;
        for record in &records {
            let index = match current {
                Some((offset, n)) if offset == record.offset() => n.saturating_add(1),
                _ => 0,
            };
            current = Some((record.offset(), index));
            slice_indices.push(index);
        }

        let mut by_reference: HashMap<usize, Vec<Interval<u64, usize>>> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            let (Some(reference_id), Some(start)) = (record.reference_sequence_id(), record.alignment_start())
            else {
                continue;
            };
            if record.alignment_span() == 0 {
                continue;
            }
            let start = usize::from(start) as u64;
            by_reference.entry(reference_id).or_default().push(Interval {
                start,
                stop: start + record.alignment_span() as u64,
                val: position,
            });
        }

        let trees = by_reference
            .into_iter()
            .map(|(reference, intervals)| (reference, Lapper::new(intervals)))
            .collect();

        Self {
            records,
            slice_indices,
            trees,
        }
    }

    pub fn records(&self) -> &[crai::Record] {
        &self.records
    }

    /// Chunks of slices overlapping `[start, end]`, in file order
    ///
    /// A slice overlaps when `alignment_start + alignment_span > start` and
    /// it begins at or before `end`.
    pub fn span_overlapping(&self, reference_id: usize, start: u32, end: Option<u32>) -> Option<FileSpan> {
        let tree = self.trees.get(&reference_id)?;
        let stop = end.map_or(u64::MAX, |e| e as u64 + 1);

        let mut hits: Vec<usize> = tree.find(start as u64, stop).map(|iv| iv.val).collect();
        if hits.is_empty() {
            return None;
        }
        hits.sort_unstable();

        let chunks = hits
            .into_iter()
            .map(|position| {
                let offset = self.records[position].offset();
                let slice = self.slice_indices[position];
                Chunk::new(
                    VirtualOffset::new(offset, slice),
                    VirtualOffset::new(offset, slice.saturating_add(1)),
                )
            })
            .collect();
        Some(FileSpan::new(optimize_chunks(chunks, VirtualOffset::ZERO)))
    }

    /// Container offset of the last placed slice
    pub fn start_of_last_linear_bin(&self) -> Option<VirtualOffset> {
        self.records
            .iter()
            .rev()
            .find(|r| r.reference_sequence_id().is_some())
            .map(|r| VirtualOffset::new(r.offset(), 0))
    }
}
