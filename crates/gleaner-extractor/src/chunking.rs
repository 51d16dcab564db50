//! Boundary-respecting chunking for documents larger than one context window

use crate::config::ChunkSizing;
use crate::error::ChunkError;
use gleaner_domain::{Chunk, ChunkId};

/// Splits text into overlapping chunks
///
/// Greedy forward scan: each chunk tentatively ends `target_size` characters
/// after its start, then the cut moves back to the nearest paragraph break,
/// sentence end or whitespace inside the look-back window. With no boundary in
/// the window the cut is made at the tentative end. The next chunk starts
/// `overlap_size` characters before the cut.
///
/// All offsets are character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEngine {
    lookback: usize,
}

impl ChunkEngine {
    /// Create a chunk engine searching at most `lookback` characters back for a boundary
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Split `text` with the given sizing
    pub fn split_with(text: &str, sizing: &ChunkSizing) -> Result<Vec<Chunk>, ChunkError> {
        Self::new(sizing.lookback).split(
            text,
            sizing.target_size,
            sizing.overlap_size,
            sizing.min_size,
        )
    }

    /// Split `text` into ordered chunks covering every character
    ///
    /// Every chunk but the last is at least `min_size` characters long. A text
    /// no longer than `target_size` comes back as a single chunk with no
    /// overlap; an empty text yields no chunks.
    pub fn split(
        &self,
        text: &str,
        target_size: usize,
        overlap_size: usize,
        min_size: usize,
    ) -> Result<Vec<Chunk>, ChunkError> {
        if target_size == 0 {
            return Err(ChunkError::ZeroTarget);
        }
        if overlap_size >= target_size {
            return Err(ChunkError::OverlapTooLarge {
                overlap: overlap_size,
                target: target_size,
            });
        }
        if min_size > target_size {
            return Err(ChunkError::MinTooLarge {
                min: min_size,
                target: target_size,
            });
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total == 0 {
            return Ok(Vec::new());
        }
        if total <= target_size {
            return Ok(vec![Chunk::whole(text)]);
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let tentative_end = start + target_size;
            if tentative_end >= total {
                chunks.push(make_chunk(&chars, start, total, chunks.len(), overlap_size));
                break;
            }

            // floor > start + overlap_size keeps the scan moving forward
            let floor = (start + min_size)
                .max(start + overlap_size + 1)
                .max(tentative_end.saturating_sub(self.lookback));
            let end = find_boundary(&chars, floor, tentative_end).unwrap_or(tentative_end);

            chunks.push(make_chunk(&chars, start, end, chunks.len(), overlap_size));
            start = end - overlap_size;
        }

        Ok(chunks)
    }
}

fn make_chunk(chars: &[char], start: usize, end: usize, index: usize, overlap: usize) -> Chunk {
    Chunk {
        chunk_id: ChunkId(index as u32),
        start_offset: start,
        end_offset: end,
        text: chars[start..end].iter().collect(),
        overlap_with_previous: if index == 0 { 0 } else { overlap },
        sequence_index: index,
    }
}

/// Best cut position in `[floor, ceiling]`: paragraph, then sentence, then whitespace
fn find_boundary(chars: &[char], floor: usize, ceiling: usize) -> Option<usize> {
    last_cut(floor, ceiling, |p| is_paragraph_cut(chars, p))
        .or_else(|| last_cut(floor, ceiling, |p| is_sentence_cut(chars, p)))
        .or_else(|| last_cut(floor, ceiling, |p| chars[p - 1].is_whitespace()))
}

fn last_cut(floor: usize, ceiling: usize, is_cut: impl Fn(usize) -> bool) -> Option<usize> {
    (floor.max(1)..=ceiling).rev().find(|&p| is_cut(p))
}

fn is_paragraph_cut(chars: &[char], p: usize) -> bool {
    p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n'
}

fn is_sentence_cut(chars: &[char], p: usize) -> bool {
    matches!(chars[p - 1], '.' | '!' | '?') && chars.get(p).is_some_and(|c| c.is_whitespace())
}
