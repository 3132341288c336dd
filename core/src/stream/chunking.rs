//! Chunk arithmetic for the payload stage.
//!
//! `chunk_count = payload_size / chunk_size`, `remainder = payload_size % chunk_size`.
//! One remainder section always follows the full chunks, even when it is empty.

use crate::constants::{CHUNK_SIZE, SECTION_OVERHEAD};
use crate::framing::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub payload_size: u64,
    pub chunk_size: usize,
    pub chunk_count: u64,
    pub remainder_size: usize,
}

impl ChunkPlan {
    pub fn new(payload_size: u64) -> Self {
        Self::with_chunk_size(payload_size, CHUNK_SIZE)
    }

    /// `chunk_size` must be non-zero.
    pub fn with_chunk_size(payload_size: u64, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            payload_size,
            chunk_size,
            chunk_count: payload_size / chunk_size as u64,
            remainder_size: (payload_size % chunk_size as u64) as usize,
        }
    }

    /// Number of sections the stage reads: every full chunk plus the remainder.
    pub fn section_count(&self) -> u64 {
        self.chunk_count + 1
    }

    /// Ciphertext length of the `seq`-th section (0-based, remainder last).
    pub fn ciphertext_len(&self, seq: u64) -> usize {
        if seq < self.chunk_count {
            self.chunk_size
        } else {
            self.remainder_size
        }
    }

    /// Section label of the `seq`-th section (0-based).
    pub fn section(&self, seq: u64) -> Section {
        if seq < self.chunk_count {
            Section::Chunk(seq + 1)
        } else {
            Section::Remainder
        }
    }

    /// `(section, ciphertext_len)` in file order.
    pub fn sections(&self) -> impl Iterator<Item = (Section, usize)> + '_ {
        (0..self.section_count()).map(move |seq| (self.section(seq), self.ciphertext_len(seq)))
    }

    /// Wire bytes of one full chunk section.
    pub fn chunk_wire_len(&self) -> u64 {
        (SECTION_OVERHEAD + self.chunk_size) as u64
    }

    /// Total wire bytes the stage consumes.
    pub fn wire_len(&self) -> u64 {
        self.chunk_count * self.chunk_wire_len() + (SECTION_OVERHEAD + self.remainder_size) as u64
    }

    /// First section that would run past `available` wire bytes, as
    /// `(section, needed, available)` for that section alone.
    pub fn locate_truncation(&self, available: u64) -> Option<(Section, u64, u64)> {
        if available >= self.wire_len() {
            return None;
        }

        let full = available / self.chunk_wire_len();
        if full < self.chunk_count {
            let left = available - full * self.chunk_wire_len();
            return Some((Section::Chunk(full + 1), self.chunk_wire_len(), left));
        }

        let left = available - self.chunk_count * self.chunk_wire_len();
        Some((
            Section::Remainder,
            (SECTION_OVERHEAD + self.remainder_size) as u64,
            left,
        ))
    }
}
