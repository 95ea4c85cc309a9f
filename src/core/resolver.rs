//! Random-access resolution
//!
//! An index only narrows a query down to candidate containers. The resolver
//! visits the candidates in file order, reads each container header and
//! stops at the first container reaching past the query start. Resolution
//! is container-granular: the slice part of each virtual offset is ignored.

use crate::core::error::Result;
use crate::core::span::FileSpan;
use crate::formats::container::ContainerHeaderReader;
use log::debug;
use std::io::{Read, Seek, SeekFrom};

/// Seek `stream` to the first candidate container overlapping `start`
///
/// On a match the stream is left at that container's first byte and its
/// offset is returned. Candidates after the match are never read.
pub fn resolve_container<S: Read + Seek>(
    stream: &mut S,
    headers: &dyn ContainerHeaderReader,
    span: &FileSpan,
    start: u32,
) -> Result<Option<u64>> {
    for (n, candidate) in span.candidate_offsets().enumerate() {
        let (offset, _slice) = candidate.decode();
        stream.seek(SeekFrom::Start(offset))?;
        let header = headers.read_header(stream)?;

        debug!(
            "Candidate {} at byte {}: ref {} start {} span {}",
            n + 1,
            offset,
            header.reference_id,
            header.alignment_start,
            header.alignment_span
        );

        if header.overlaps_start(start as i64) {
            stream.seek(SeekFrom::Start(offset))?;
            return Ok(Some(offset));
        }
    }

    debug!("No candidate of {} overlaps start {}", span.len(), start);
    Ok(None)
}
