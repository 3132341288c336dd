// ## 📂 File: `src/headers/decode.rs`
//! src/headers/decode.rs
//!
//! Header section decoding.
//!
//! Design notes:
//! - The header section always carries 48 plaintext bytes: wave header (44) + metadata size (4).
//! - Both size fields are read only after the tag verifies.
//! - The metadata size is validated before it is used to size the next read.

use std::io::Read;
use byteorder::{ByteOrder, LittleEndian};

use crate::constants::{
    DIGEST_SIZE, HEADER_AAD, HEADER_PLAINTEXT_SIZE, WAVE_HEADER_SIZE,
};
use crate::crypto::SectionAead;
use crate::framing::{decode_section_with_layout, Section, SectionLayout};
use crate::headers::types::{ContainerHeader, HeaderError, WaveHeader};
use crate::types::DecodeError;

/// Split a verified 48-byte header plaintext into its fields.
pub fn parse_container_header(plaintext: &[u8]) -> Result<ContainerHeader, HeaderError> {
    if plaintext.len() != HEADER_PLAINTEXT_SIZE {
        return Err(HeaderError::BufferLength {
            section: Section::Header,
            expected: HEADER_PLAINTEXT_SIZE,
            actual: plaintext.len(),
        });
    }

    let wave = WaveHeader::from_slice(&plaintext[..WAVE_HEADER_SIZE])?;
    let metadata_size = LittleEndian::read_u32(&plaintext[WAVE_HEADER_SIZE..]);
    let payload_size = wave.data_size();

    Ok(ContainerHeader {
        wave,
        metadata_size,
        payload_size,
    })
}

/// Bound the declared metadata size before allocating for it.
pub fn validate_metadata_size(size: u32, max: usize) -> Result<usize, HeaderError> {
    let size_u64 = size as u64;
    if (size as usize) < DIGEST_SIZE {
        return Err(HeaderError::MetadataTooSmall {
            size: size_u64,
            min: DIGEST_SIZE,
        });
    }
    if size_u64 > max as u64 {
        return Err(HeaderError::MetadataTooLarge { size: size_u64, max });
    }
    Ok(size as usize)
}

/// Read, authenticate and parse the header section laid out as `layout`.
pub fn decode_container_header<R: Read + ?Sized>(
    reader: &mut R,
    aead: &dyn SectionAead,
    layout: SectionLayout,
) -> Result<ContainerHeader, DecodeError> {
    let plaintext = decode_section_with_layout(
        reader,
        aead,
        Section::Header,
        HEADER_PLAINTEXT_SIZE,
        HEADER_AAD,
        layout,
    )?;
    let header = parse_container_header(&plaintext)?;

    if !header.wave.has_riff_tags() {
        log::warn!("wave header lacks RIFF/WAVE tags; copying it verbatim");
    }
    log::info!(
        "header verified: metadata_size={} payload_size={}",
        header.metadata_size,
        header.payload_size
    );

    Ok(header)
}
