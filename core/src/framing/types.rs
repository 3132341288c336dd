use std::fmt;
use bytes::Bytes;
use thiserror::Error;

use crate::constants::{MAC_SIZE, NONCE_SIZE, SECTION_OVERHEAD};
use crate::crypto::CryptoError;

/// Position of a section inside the container, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Header,
    Metadata,
    /// 1-based chunk number.
    Chunk(u64),
    Remainder,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Header => f.write_str("header section"),
            Section::Metadata => f.write_str("metadata section"),
            Section::Chunk(i) => write!(f, "chunk {}", i),
            Section::Remainder => f.write_str("remainder section"),
        }
    }
}

/// Where the tag sits relative to the ciphertext.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SectionLayout {
    /// `[nonce][tag][ciphertext]`, used by every section of the documented format.
    #[default]
    TagFirst,
    /// `[nonce][ciphertext][tag]`, how the reference producer seals the header section.
    TagLast,
}

/// One authenticated section as laid out on the wire:
/// `[nonce 12][tag 16][ciphertext]`.
///
/// `ciphertext` is a zero-copy view into the wire buffer.
#[derive(Debug, Clone)]
pub struct SealedSection {
    pub section: Section,
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; MAC_SIZE],
    pub ciphertext: Bytes,
}

impl SealedSection {
    pub fn wire_len(&self) -> usize {
        SECTION_OVERHEAD + self.ciphertext.len()
    }

    /// `ciphertext ‖ tag`, the order the AEAD primitive expects.
    pub fn combined(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.ciphertext.len() + MAC_SIZE);
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("truncated input in {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: Section,
        needed: u64,
        available: u64,
    },

    #[error("I/O error reading {section}: {source}")]
    Io {
        section: Section,
        #[source]
        source: std::io::Error,
    },

    #[error("authentication failed in {section}")]
    Authentication { section: Section },

    #[error("crypto error in {section}: {source}")]
    Crypto {
        section: Section,
        #[source]
        source: CryptoError,
    },

    #[error("plaintext length mismatch in {section}: expected {expected}, got {actual}")]
    LengthMismatch {
        section: Section,
        expected: usize,
        actual: usize,
    },
}

impl FrameError {
    pub fn section(&self) -> Section {
        match self {
            FrameError::Truncated { section, .. }
            | FrameError::Io { section, .. }
            | FrameError::Authentication { section }
            | FrameError::Crypto { section, .. }
            | FrameError::LengthMismatch { section, .. } => *section,
        }
    }
}
