//! Metadata section decoding.
//!
//! The first 32 plaintext bytes are the content digest reused as chunk AAD.
//! Remaining bytes are kept but not interpreted.

use std::io::Read;
use bytes::Bytes;

use crate::constants::{DIGEST_SIZE, METADATA_AAD};
use crate::crypto::SectionAead;
use crate::framing::{decode_section, Section};
use crate::headers::types::{ContentDigest, HeaderError, Metadata};
use crate::types::DecodeError;

pub fn parse_metadata(plaintext: Bytes) -> Result<Metadata, HeaderError> {
    if plaintext.len() < DIGEST_SIZE {
        return Err(HeaderError::BufferLength {
            section: Section::Metadata,
            expected: DIGEST_SIZE,
            actual: plaintext.len(),
        });
    }

    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(&plaintext[..DIGEST_SIZE]);

    Ok(Metadata::new(ContentDigest::from_bytes(digest), plaintext))
}

/// Read, authenticate and parse the `metadata_size`-byte metadata section.
pub fn decode_metadata<R: Read + ?Sized>(
    reader: &mut R,
    aead: &dyn SectionAead,
    metadata_size: usize,
) -> Result<Metadata, DecodeError> {
    let plaintext = decode_section(reader, aead, Section::Metadata, metadata_size, METADATA_AAD)?;
    let metadata = parse_metadata(plaintext)?;

    log::info!(
        "metadata verified: {} bytes, digest={}",
        metadata.plaintext_len(),
        metadata.content_digest().to_hex()
    );

    Ok(metadata)
}
