//! Reference sequence access
//!
//! Record codecs need reference bases to restore reference-compressed
//! reads. The reader only carries the handle; fetching is up to the
//! implementation.

use std::collections::HashMap;

/// Source of reference bases, looked up by sequence name
pub trait ReferenceSource {
    /// Full bases of the named sequence
    fn fetch(&self, name: &str) -> Option<Vec<u8>>;
}

/// Source that knows no sequences
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReference;

impl ReferenceSource for NoReference {
    fn fetch(&self, _name: &str) -> Option<Vec<u8>> {
        None
    }
}

/// Sequences held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryReference {
    sequences: HashMap<String, Vec<u8>>,
}

impl InMemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bases: impl Into<Vec<u8>>) {
        self.sequences.insert(name.into(), bases.into());
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
}

impl ReferenceSource for InMemoryReference {
    fn fetch(&self, name: &str) -> Option<Vec<u8>> {
        self.sequences.get(name).cloned()
    }
}
