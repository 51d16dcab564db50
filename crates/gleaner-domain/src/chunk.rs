//! Chunk module - contiguous, possibly overlapping slices of a document

use std::fmt;

/// Identifier of a chunk within one document
///
/// Chunk ids equal the chunk's sequence index, so ordering by id is
/// ordering by position in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkId(pub u32);

impl ChunkId {
    /// Numeric value
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A slice of the source document
///
/// Offsets are character offsets into the source text; `end_offset` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk identifier
    pub chunk_id: ChunkId,
    /// Start offset (inclusive, in characters)
    pub start_offset: usize,
    /// End offset (exclusive, in characters)
    pub end_offset: usize,
    /// Text of `[start_offset, end_offset)`
    pub text: String,
    /// Characters shared with the previous chunk
    pub overlap_with_previous: usize,
    /// Position in the chunk sequence
    pub sequence_index: usize,
}

impl Chunk {
    /// Length in characters
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// True for a zero-length chunk (never produced by the chunk engine)
    pub fn is_empty(&self) -> bool {
        self.end_offset == self.start_offset
    }

    /// Build the single chunk that covers a whole text
    pub fn whole(text: &str) -> Self {
        Self {
            chunk_id: ChunkId(0),
            start_offset: 0,
            end_offset: text.chars().count(),
            text: text.to_string(),
            overlap_with_previous: 0,
            sequence_index: 0,
        }
    }
}
