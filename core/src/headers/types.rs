// ## 📂 File: `src/headers/types.rs`

//! headers/types.rs
//! Decoded header and metadata views.
//!
//! Notes:
//! - The 44-byte wave header is kept verbatim; it is written to the output unchanged.
//! - Typed accessors read the standard RIFF/WAVE fields little-endian.
//! - Only `data_size` (offsets 40..44) drives decoding.

use std::fmt;
use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::constants::{DIGEST_SIZE, WAVE_HEADER_SIZE};
use crate::framing::Section;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("{section} plaintext has {actual} bytes, expected {expected}")]
    BufferLength {
        section: Section,
        expected: usize,
        actual: usize,
    },

    #[error("declared metadata size {size} is below the {min}-byte content digest")]
    MetadataTooSmall { size: u64, min: usize },

    #[error("declared metadata size {size} exceeds the {max}-byte limit")]
    MetadataTooLarge { size: u64, max: usize },
}

impl HeaderError {
    /// Section whose plaintext carried the offending value.
    pub fn section(&self) -> Section {
        match self {
            HeaderError::BufferLength { section, .. } => *section,
            HeaderError::MetadataTooSmall { .. } | HeaderError::MetadataTooLarge { .. } => {
                Section::Header
            }
        }
    }
}

/// Verbatim 44-byte RIFF/WAVE header.
#[derive(Clone, PartialEq, Eq)]
pub struct WaveHeader {
    bytes: [u8; WAVE_HEADER_SIZE],
}

impl WaveHeader {
    pub const LEN: usize = WAVE_HEADER_SIZE;

    pub fn from_slice(buf: &[u8]) -> Result<Self, HeaderError> {
        let bytes: [u8; WAVE_HEADER_SIZE] =
            buf.try_into().map_err(|_| HeaderError::BufferLength {
                section: Section::Header,
                expected: WAVE_HEADER_SIZE,
                actual: buf.len(),
            })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; WAVE_HEADER_SIZE] {
        &self.bytes
    }

    /// `RIFF` + `WAVE` tags present at offsets 0 and 8.
    pub fn has_riff_tags(&self) -> bool {
        &self.bytes[0..4] == b"RIFF" && &self.bytes[8..12] == b"WAVE"
    }

    pub fn riff_size(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[4..8])
    }

    pub fn channels(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[22..24])
    }

    pub fn sample_rate(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[24..28])
    }

    pub fn byte_rate(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[28..32])
    }

    pub fn block_align(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[32..34])
    }

    pub fn bits_per_sample(&self) -> u16 {
        LittleEndian::read_u16(&self.bytes[34..36])
    }

    /// PCM payload length declared by the trailing 4 bytes.
    pub fn data_size(&self) -> u32 {
        LittleEndian::read_u32(&self.bytes[40..44])
    }

    pub fn summary(&self) -> WaveSummary {
        WaveSummary {
            riff_tagged: self.has_riff_tags(),
            riff_size: self.riff_size(),
            channels: self.channels(),
            sample_rate: self.sample_rate(),
            byte_rate: self.byte_rate(),
            block_align: self.block_align(),
            bits_per_sample: self.bits_per_sample(),
            data_size: self.data_size(),
        }
    }
}

impl fmt::Debug for WaveHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveHeader")
            .field("channels", &self.channels())
            .field("sample_rate", &self.sample_rate())
            .field("bits_per_sample", &self.bits_per_sample())
            .field("data_size", &self.data_size())
            .finish()
    }
}

/// Serializable view of the wave header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaveSummary {
    pub riff_tagged: bool,
    pub riff_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

/// Output of the header stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub wave: WaveHeader,
    /// Ciphertext length of the metadata section.
    pub metadata_size: u32,
    /// Total PCM bytes carried by the chunk sections.
    pub payload_size: u32,
}

/// 32-byte content digest, the AAD of every chunk section.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; DIGEST_SIZE]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

/// Output of the metadata stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    digest: ContentDigest,
    plaintext: Bytes,
}

impl Metadata {
    pub fn new(digest: ContentDigest, plaintext: Bytes) -> Self {
        Self { digest, plaintext }
    }

    pub fn content_digest(&self) -> ContentDigest {
        self.digest
    }

    /// Bytes after the digest; carried but not interpreted.
    pub fn reserved(&self) -> &[u8] {
        &self.plaintext[DIGEST_SIZE..]
    }

    /// Decrypted section length, digest included.
    pub fn plaintext_len(&self) -> usize {
        self.plaintext.len()
    }
}
