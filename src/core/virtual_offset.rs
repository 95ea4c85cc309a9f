//! Virtual offsets
//!
//! A virtual offset packs a container byte offset (upper 48 bits) and a
//! sub-unit index inside that container (lower 16 bits) into one `u64`.
//! This is the convention shared with BAI indices built over CRAM files,
//! where the sub-unit is the slice index.

use std::fmt;

/// Number of low bits holding the sub-unit index
pub const SUB_UNIT_BITS: u32 = 16;

/// Largest container byte offset a virtual offset can carry
pub const MAX_CONTAINER_OFFSET: u64 = (1 << 48) - 1;

/// Split a raw virtual offset into (container byte offset, sub-unit index)
#[inline]
pub const fn decode(raw: u64) -> (u64, u16) {
    (raw >> SUB_UNIT_BITS, raw as u16)
}

/// Pack a container byte offset and sub-unit index
///
/// Bits of `container_offset` above 48 are discarded.
#[inline]
pub const fn encode(container_offset: u64, sub_unit_index: u16) -> u64 {
    ((container_offset & MAX_CONTAINER_OFFSET) << SUB_UNIT_BITS) | sub_unit_index as u64
}

/// A (container offset, sub-unit index) pair stored as one `u64`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Virtual offset pointing at the start of the file
    pub const ZERO: VirtualOffset = VirtualOffset(0);

    pub const fn new(container_offset: u64, sub_unit_index: u16) -> Self {
        Self(encode(container_offset, sub_unit_index))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Byte offset of the container in the file
    pub const fn container_offset(self) -> u64 {
        decode(self.0).0
    }

    /// Slice (sub-unit) index inside the container
    pub const fn sub_unit_index(self) -> u16 {
        decode(self.0).1
    }

    pub const fn decode(self) -> (u64, u16) {
        decode(self.0)
    }

    /// True when both offsets address the same container
    pub const fn same_container(self, other: VirtualOffset) -> bool {
        self.container_offset() == other.container_offset()
    }
}

impl From<u64> for VirtualOffset {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<VirtualOffset> for u64 {
    fn from(offset: VirtualOffset) -> Self {
        offset.0
    }
}

impl fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container_offset(), self.sub_unit_index())
    }
}
